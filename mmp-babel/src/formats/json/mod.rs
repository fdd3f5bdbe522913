//! JSON dump of the IR
//!
//! Serializes the normalized manifest with `serde_json`, tags in snake case. Meant for tooling
//! and for diffing what normalization did.

use crate::error::FormatError;
use crate::format::Format;
use mmp_parser::mmp::Manifest;

pub struct JsonFormat;

impl Format for JsonFormat {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "JSON dump of the IR"
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn serialize(&self, manifest: &Manifest) -> Result<String, FormatError> {
        serde_json::to_string_pretty(manifest)
            .map_err(|e| FormatError::SerializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmp_parser::mmp::ManifestLoader;

    #[test]
    fn test_json_dump() {
        let manifest = ManifestLoader::from_string("[a]\n").manifest().unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&JsonFormat.serialize(&manifest).unwrap()).unwrap();
        assert_eq!(json["legal"], serde_json::json!(true));
        assert_eq!(json["root"]["tag"], serde_json::json!("manifest"));
        let table = &json["root"]["children"][0]["syntax"];
        assert_eq!(table["table_key"]["text"], serde_json::json!("a"));
    }
}
