//! Transform pipeline
//!
//!     Conversion is a chain of stages, each turning one representation into the next:
//!
//!         String --Parsing--> SyntaxTree --Reduction--> Reduced<SyntaxNode> --Normalization--> Manifest
//!
//!     A stage implements [`Runnable`]. A [`Transform`] wraps stages and chains them with
//!     [`Transform::then`]; the compiler checks that each stage accepts what the previous one
//!     produced. Common pipelines are prebuilt as lazy statics in [`standard`]:
//!
//! ```rust,ignore
//! use mmp_parser::mmp::transforms::standard::STRING_TO_MANIFEST;
//!
//! let manifest = STRING_TO_MANIFEST.run("[DEFAULT]\ntags = a b\n".to_string())?;
//! assert!(!manifest.is_legal());
//! ```
//!
//!     Pipelines built from configuration (another start symbol, other key tables) come from
//!     [`standard::manifest_transform`].

pub mod stages;
pub mod standard;

use crate::mmp::error::ParseError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A single stage from `I` to `O`.
pub trait Runnable<I, O> {
    fn run(&self, input: I) -> Result<O, TransformError>;
}

/// A composable pipeline from `I` to `O`.
pub struct Transform<I, O> {
    run_fn: Box<dyn Fn(I) -> Result<O, TransformError> + Send + Sync>,
}

impl<I, O> Transform<I, O> {
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(I) -> Result<O, TransformError> + Send + Sync + 'static,
    {
        Transform {
            run_fn: Box::new(f),
        }
    }

    /// Append a stage, feeding it this transform's output.
    pub fn then<O2, S>(self, stage: S) -> Transform<I, O2>
    where
        S: Runnable<O, O2> + Send + Sync + 'static,
        I: 'static,
        O: 'static,
        O2: 'static,
    {
        let previous = self.run_fn;
        Transform {
            run_fn: Box::new(move |input| stage.run(previous(input)?)),
        }
    }

    /// Append a prebuilt static pipeline.
    pub fn then_transform<O2>(self, next: &'static Transform<O, O2>) -> Transform<I, O2>
    where
        I: 'static,
        O: 'static,
        O2: 'static,
    {
        let previous = self.run_fn;
        Transform {
            run_fn: Box::new(move |input| next.run(previous(input)?)),
        }
    }

    pub fn run(&self, input: I) -> Result<O, TransformError> {
        (self.run_fn)(input)
    }
}

impl<I, O> Runnable<I, O> for Transform<I, O>
where
    I: 'static,
    O: 'static,
{
    fn run(&self, input: I) -> Result<O, TransformError> {
        Transform::run(self, input)
    }
}
