//! Pattern extraction over normalized source files.
//!
//! All scans are pure functions of the file text, so running them during
//! discovery and again during graph assembly gives the same result.

pub mod addresses;
pub mod implementations;
pub mod lexer;
pub mod types;

use libsonar_core::types::{Address, AnalyzedContract, AnalyzedSource};

use crate::config::CrawlerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractLimits {
    pub max_addresses_per_file: usize,
    pub max_declared_impls_per_file: usize,
}

impl From<&CrawlerConfig> for ExtractLimits {
    fn from(cfg: &CrawlerConfig) -> Self {
        Self {
            max_addresses_per_file: cfg.max_addresses_per_file,
            max_declared_impls_per_file: cfg.max_declared_impls_per_file,
        }
    }
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self::from(&CrawlerConfig::default())
    }
}

fn merge(into: &mut Vec<Address>, found: Vec<Address>) {
    for address in found {
        if !into.contains(&address) {
            into.push(address);
        }
    }
}

/// Run all scans over every source file of `contract`.
pub fn analyze_source(contract: &AnalyzedContract, limits: ExtractLimits) -> AnalyzedSource {
    let own = contract.address;
    let mut analyzed = AnalyzedSource {
        files: contract.source_files.clone(),
        ..Default::default()
    };
    for file in &contract.source_files {
        let tokens = lexer::tokenize(&file.content);
        merge(
            &mut analyzed.hardcoded_addresses,
            addresses::scan_hardcoded_addresses(&tokens, own, limits.max_addresses_per_file),
        );
        merge(
            &mut analyzed.declared_implementations,
            implementations::scan_declared_implementations(
                &tokens,
                own,
                limits.max_declared_impls_per_file,
            ),
        );
        analyzed.types.extend(types::scan_type_definitions(
            &tokens,
            &file.path,
            contract.name.as_deref(),
        ));
    }
    analyzed
}

#[cfg(test)]
mod tests {
    use libsonar_core::types::{KindOnChain, SourceFile, SourceType, TypeKind};

    use super::*;

    fn file(path: &str, content: &str) -> SourceFile {
        SourceFile {
            path: path.to_string(),
            content: content.to_string(),
            source_type: SourceType::Verified,
        }
    }

    #[test]
    fn test_analyze_multi_file_contract() {
        let mut c = AnalyzedContract::new(Address::repeat_byte(0x42), KindOnChain::Proxy);
        c.name = Some("Proxy".to_string());
        c.source_files = vec![
            file(
                "Proxy.sol",
                r#"
                import "./IProxy.sol";
                contract Proxy is IProxy {
                    address implementation = 0x1111111111111111111111111111111111111111;
                    address constant ORACLE = 0x2222222222222222222222222222222222222222;
                }
                "#,
            ),
            file(
                "IProxy.sol",
                r#"
                // deployed at 0x2222222222222222222222222222222222222222
                interface IProxy { }
                "#,
            ),
        ];

        let analyzed = analyze_source(&c, ExtractLimits::default());
        assert_eq!(analyzed.files, c.source_files);
        assert_eq!(
            analyzed.hardcoded_addresses,
            vec![Address::repeat_byte(0x11), Address::repeat_byte(0x22)]
        );
        assert_eq!(analyzed.declared_implementations, vec![Address::repeat_byte(0x11)]);
        let types: Vec<(&str, TypeKind, &str)> = analyzed
            .types
            .iter()
            .map(|t| (t.name.as_str(), t.kind, t.source_path.as_str()))
            .collect();
        assert_eq!(
            types,
            vec![
                ("Proxy", TypeKind::ContractImpl, "Proxy.sol"),
                ("IProxy", TypeKind::Interface, "IProxy.sol"),
            ]
        );
        assert_eq!(analyzed.types[0].interfaces, vec!["IProxy"]);
        assert!(analyzed.types[0].is_root_contract_type);

        // same input, same output
        assert_eq!(analyze_source(&c, ExtractLimits::default()), analyzed);
    }

    #[test]
    fn test_no_source_no_findings() {
        let c = AnalyzedContract::new(Address::repeat_byte(1), KindOnChain::ContractSimple);
        assert_eq!(analyze_source(&c, ExtractLimits::default()), AnalyzedSource::default());
    }
}
