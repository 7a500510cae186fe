use libsonar_core::types::{SourceFile, SourceType};
use serde_json::{Map, Value};

/// The shapes a verified-source payload comes in.
///
/// Explorers return either the file text itself, a flat JSON object mapping
/// paths to files, or a compiler standard JSON input (often wrapped in an
/// extra pair of braces). Files keep the order of the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePayload {
    RawSingleFile(String),
    StandardJsonInput(Vec<(String, String)>),
    FlatFileMap(Vec<(String, String)>),
}

/// `{"A.sol": {"content": "..."}}` or `{"A.sol": "..."}`
fn file_entries(map: &Map<String, Value>) -> Option<Vec<(String, String)>> {
    let mut files = Vec::with_capacity(map.len());
    for (path, entry) in map {
        let content = match entry {
            Value::String(s) => s.as_str(),
            Value::Object(o) => o.get("content")?.as_str()?,
            _ => return None,
        };
        files.push((path.clone(), content.to_string()));
    }
    if files.is_empty() {
        None
    } else {
        Some(files)
    }
}

fn parse_json(text: &str) -> Option<SourcePayload> {
    let value: Value = serde_json::from_str(text).ok()?;
    let object = value.as_object()?;
    match object.get("sources") {
        Some(Value::Object(sources)) => file_entries(sources).map(SourcePayload::StandardJsonInput),
        Some(_) => None,
        None => file_entries(object).map(SourcePayload::FlatFileMap),
    }
}

impl SourcePayload {
    /// Decide the shape of `raw`. Anything that is not a recognizable JSON
    /// file map is kept verbatim as a single file.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let parsed = if trimmed.starts_with("{{") && trimmed.ends_with("}}") {
            parse_json(&trimmed[1..trimmed.len() - 1])
        } else if trimmed.starts_with('{') {
            parse_json(trimmed)
        } else {
            None
        };
        parsed.unwrap_or_else(|| Self::RawSingleFile(raw.to_string()))
    }

    pub fn into_files(self, contract_name: Option<&str>, source_type: SourceType) -> Vec<SourceFile> {
        let entries = match self {
            Self::RawSingleFile(content) => {
                let name = contract_name
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .unwrap_or("Contract");
                vec![(format!("{}.sol", name), content)]
            }
            Self::StandardJsonInput(files) | Self::FlatFileMap(files) => files,
        };
        entries
            .into_iter()
            .map(|(path, content)| SourceFile {
                path,
                content,
                source_type,
            })
            .collect()
    }
}

/// Normalize a raw explorer payload into an ordered file list.
pub fn normalize_sources(raw: &str, contract_name: Option<&str>, source_type: SourceType) -> Vec<SourceFile> {
    SourcePayload::parse(raw).into_files(contract_name, source_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_json_input() {
        let raw = r#"{{
            "language": "Solidity",
            "sources": {
                "src/Token.sol": {"content": "contract Token is ERC20 {}"},
                "lib/ERC20.sol": {"content": "abstract contract ERC20 {}"}
            },
            "settings": {"optimizer": {"enabled": true}}
        }}"#;
        let payload = SourcePayload::parse(raw);
        assert!(matches!(payload, SourcePayload::StandardJsonInput(_)));
        let files = payload.into_files(Some("Token"), SourceType::Verified);
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/Token.sol", "lib/ERC20.sol"]);
        assert_eq!(files[0].content, "contract Token is ERC20 {}");
        assert_eq!(files[1].source_type, SourceType::Verified);
    }

    #[test]
    fn test_single_brace_standard_json() {
        let raw = r#"{"sources": {"A.sol": {"content": "contract A {}"}}}"#;
        let files = normalize_sources(raw, None, SourceType::Verified);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "A.sol");
    }

    #[test]
    fn test_flat_file_map() {
        let raw = r#"{"A.sol": {"content": "contract A {}"}, "B.sol": "contract B {}"}"#;
        assert_eq!(
            SourcePayload::parse(raw),
            SourcePayload::FlatFileMap(vec![
                ("A.sol".to_string(), "contract A {}".to_string()),
                ("B.sol".to_string(), "contract B {}".to_string()),
            ])
        );
    }

    #[test]
    fn test_plain_text_named_after_contract() {
        let raw = "pragma solidity 0.4.24;\ncontract Vault {}\n";
        let files = normalize_sources(raw, Some("Vault"), SourceType::Verified);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "Vault.sol");
        assert_eq!(files[0].content, raw);
    }

    #[test]
    fn test_malformed_json_kept_verbatim() {
        let raw = r#"{{ "sources": { "A.sol": {"content": "contract A {}"} "#;
        let files = normalize_sources(raw, Some("Broken"), SourceType::Verified);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "Broken.sol");
        assert_eq!(files[0].content, raw);

        // valid JSON that is not a file map
        let raw = r#"{"language": "Solidity", "sources": []}"#;
        let files = normalize_sources(raw, None, SourceType::Verified);
        assert_eq!(files[0].path, "Contract.sol");
        assert_eq!(files[0].content, raw);
    }
}
