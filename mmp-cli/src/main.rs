//! Command-line interface for mmp
//! This binary converts Mozilla's legacy INI test manifests to TOML (and back), and finds the
//! manifests of a mozilla-central checkout.
//!
//! Usage:
//!   mmp convert `<paths>`... [--to `<format>`] [-o `<file>`] [--write]  - Convert manifests
//!   mmp find [--topsrcdir `<dir>`] [--match `<regex>`]                  - List manifests to convert
//!   mmp read `<path>` [-s] [-o `<file>`]                                - Check a TOML manifest, optionally sorting it
//!   mmp formats                                                       - List available formats
//!
//! Settings come from the built-in defaults, then `./.mmp.toml`, then `--config FILE`, then
//! the command-line flags.

mod convert;
mod discovery;

use clap::{Arg, ArgAction, ArgMatches, Command};
use convert::{ConvertError, Converter};
use discovery::{Discovery, DiscoveryError};
use mmp_babel::formats::toml::sort_sections;
use mmp_babel::{FormatError, FormatRegistry, Pipeline};
use mmp_config::{ConfigError, Loader, MmpConfig};
use mmp_parser::mmp::transforms::standard::manifest_transform;
use mmp_parser::mmp::{ClassificationError, Grammar};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

const LOCAL_CONFIG: &str = ".mmp.toml";
const TOPSRCDIR_ENV: &str = "MOZILLA_CENTRAL";

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid key tables: {0}")]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Usage(String),

    #[error("{0} file(s) failed to convert")]
    Failed(usize),
}

fn main() {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("verbose"));

    if let Err(e) = run(&matches) {
        tracing::error!(error = %e, "mmp failed");
        eprintln!("mmp: {}", e);
        std::process::exit(1);
    }
}

fn cli() -> Command {
    Command::new("mmp")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert Mozilla test manifests from the legacy INI dialect to TOML")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log pipeline details to stderr")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("Configuration file layered over the defaults and ./.mmp.toml")
                .global(true),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert manifests to another format")
                .arg(
                    Arg::new("paths")
                        .help("Manifests to convert ('-' reads standard input)")
                        .required(true)
                        .num_args(1..),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .short('t')
                        .value_name("FORMAT")
                        .help("Output format (default: convert.target from the configuration)"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_name("FILE")
                        .help("Write the result to FILE instead of stdout")
                        .conflicts_with("write"),
                )
                .arg(
                    Arg::new("write")
                        .long("write")
                        .short('w')
                        .help("Write each result next to its source, with the format's extension")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("strict")
                        .long("strict")
                        .help("Fail on manifests that are not already legal TOML")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("debug-parens")
                        .long("debug-parens")
                        .help("Parenthesize nested condition groups")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("implicit-or")
                        .long("implicit-or")
                        .help("Keep line-continuation ORs implicit instead of writing '||'")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("find")
                .about("List the manifests of a mozilla-central checkout")
                .arg(
                    Arg::new("topsrcdir")
                        .long("topsrcdir")
                        .short('d')
                        .value_name("DIR")
                        .help("Top of the checkout (default: $MOZILLA_CENTRAL or .)"),
                )
                .arg(
                    Arg::new("match")
                        .long("match")
                        .short('m')
                        .value_name("REGEX")
                        .help("Manifest file names to report (whole-name match)"),
                )
                .arg(
                    Arg::new("ignore-includes")
                        .long("ignore-includes")
                        .help("Do not report manifests just because they contain [include:]")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("follow-includes")
                        .long("follow-includes")
                        .help("Also report the manifests named by [include:] headers")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("read")
                .about("Check a TOML manifest and print it back")
                .arg(Arg::new("path").help("TOML manifest").required(true).index(1))
                .arg(
                    Arg::new("alpha-sort")
                        .long("alpha-sort")
                        .short('s')
                        .help("Put DEFAULT first and sort the other sections alphabetically")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_name("FILE")
                        .help("Write the result to FILE instead of stdout"),
                ),
        )
        .subcommand(Command::new("formats").about("List available formats"))
}

/// Logs go to stderr; `RUST_LOG` wins over `-v`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(matches: &ArgMatches) -> Result<(), CliError> {
    match matches.subcommand() {
        Some(("convert", sub)) => handle_convert_command(sub),
        Some(("find", sub)) => handle_find_command(sub),
        Some(("read", sub)) => handle_read_command(sub),
        Some(("formats", sub)) => handle_formats_command(sub),
        _ => Err(CliError::Usage("unknown command".to_string())),
    }
}

/// Defaults, then `./.mmp.toml`, then `--config`, then whatever `overrides` sets.
fn load_config<F>(matches: &ArgMatches, overrides: F) -> Result<MmpConfig, CliError>
where
    F: FnOnce(Loader) -> Result<Loader, ConfigError>,
{
    let mut loader = Loader::new().with_optional_file(LOCAL_CONFIG);
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    Ok(overrides(loader)?.build()?)
}

fn handle_convert_command(matches: &ArgMatches) -> Result<(), CliError> {
    let to = matches.get_one::<String>("to").cloned();
    let config = load_config(matches, |mut loader| {
        if let Some(to @ ("toml" | "ini")) = to.as_deref() {
            loader = loader.set_override("convert.target", to)?;
        }
        if matches.get_flag("strict") {
            loader = loader.set_override("convert.strict", true)?;
        }
        if matches.get_flag("debug-parens") {
            loader = loader.set_override("convert.debug-parenthesize", true)?;
        }
        if matches.get_flag("implicit-or") {
            loader = loader.set_override("convert.explicit-or", false)?;
        }
        Ok(loader)
    })?;

    let classification = Arc::new(config.keys.to_classification()?);
    let transform = manifest_transform(Arc::new(Grammar::manifest()), classification);
    let registry =
        FormatRegistry::configured(config.convert.render_options(), Pipeline::new(Arc::new(transform)));

    let target = to.unwrap_or_else(|| config.convert.target.format_name().to_string());
    let format = registry.get(&target)?;

    let paths: Vec<PathBuf> = matches
        .get_many::<String>("paths")
        .map(|values| values.map(PathBuf::from).collect())
        .unwrap_or_default();
    let write = matches.get_flag("write");
    let output = matches.get_one::<String>("output").map(PathBuf::from);
    if output.is_some() && paths.len() > 1 {
        return Err(CliError::Usage(
            "--output takes a single input; use --write for several".to_string(),
        ));
    }
    if write && paths.iter().any(|p| p.as_os_str() == convert::STDIN) {
        return Err(CliError::Usage(
            "--write needs file paths, not standard input".to_string(),
        ));
    }

    tracing::debug!(files = paths.len(), target = %target, write, "converting");
    let converter = Converter::new(&registry, &target);
    let mut failed = 0;
    for converted in converter.convert_all(&paths) {
        let text = match converted.result {
            Ok(text) => text,
            Err(e) => {
                failed += 1;
                tracing::warn!(path = %converted.path.display(), error = %e, "conversion failed");
                eprintln!("{}: {}", converted.path.display(), e);
                continue;
            }
        };
        if write {
            let destination = convert::output_path(&converted.path, format.extension());
            convert::write_output(&destination, &text)?;
            println!("{}", destination.display());
        } else if let Some(path) = &output {
            convert::write_output(path, &text)?;
        } else {
            print!("{}", text);
        }
    }

    match failed {
        0 => Ok(()),
        n => Err(CliError::Failed(n)),
    }
}

fn handle_find_command(matches: &ArgMatches) -> Result<(), CliError> {
    let config = load_config(matches, |mut loader| {
        if let Some(pattern) = matches.get_one::<String>("match") {
            loader = loader.set_override("discovery.match", pattern.as_str())?;
        }
        if matches.get_flag("ignore-includes") {
            loader = loader.set_override("discovery.ignore-includes", true)?;
        }
        if matches.get_flag("follow-includes") {
            loader = loader.set_override("discovery.follow-includes", true)?;
        }
        Ok(loader)
    })?;

    let topsrcdir = matches
        .get_one::<String>("topsrcdir")
        .cloned()
        .or_else(|| std::env::var(TOPSRCDIR_ENV).ok())
        .unwrap_or_else(|| ".".to_string());

    let discovery = &config.discovery;
    let manifests = Discovery::new(&topsrcdir, &discovery.pattern)?
        .skip_prefix(discovery.skip_prefix.as_str())
        .ignore_includes(discovery.ignore_includes)
        .follow_includes(discovery.follow_includes)
        .find()?;

    for manifest in manifests {
        println!("{}", manifest);
    }
    Ok(())
}

fn handle_read_command(matches: &ArgMatches) -> Result<(), CliError> {
    let path = matches
        .get_one::<String>("path")
        .map(PathBuf::from)
        .ok_or_else(|| CliError::Usage("read needs a path".to_string()))?;
    let source = read_file(&path)?;
    let text = sort_sections(&source, matches.get_flag("alpha-sort"))?;
    match matches.get_one::<String>("output") {
        Some(output) => convert::write_output(Path::new(output), &text)?,
        None => print!("{}", text),
    }
    Ok(())
}

fn handle_formats_command(_matches: &ArgMatches) -> Result<(), CliError> {
    let registry = FormatRegistry::with_defaults();
    println!("Available formats:\n");
    for name in registry.list_formats() {
        let format = registry.get(&name)?;
        let mut modes = Vec::new();
        if format.supports_parsing() {
            modes.push("parse");
        }
        if format.supports_serialization() {
            modes.push("serialize");
        }
        println!("  {} ({})", name, modes.join(", "));
        println!("    {}", format.description());
        println!();
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}
