use async_trait::async_trait;
use libsonar_core::{
    adapters::{AbiOnly, CreatorInfo, ExplorerClient, InternalTransaction, VerifiedSource},
    error::SonarError,
    types::{canonical, Address, CompilerMetadata},
};
use serde::Deserialize;
use libsonar_utils::log::debug;

use crate::{
    config::ExplorerConfig,
    fetcher::{Envelope, Fetcher},
};

static NOT_VERIFIED: &str = "not verified";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct SourceCodeItem {
    source_code: String,
    #[serde(rename = "ABI")]
    abi: String,
    contract_name: String,
    compiler_version: String,
    optimization_used: String,
    runs: String,
    constructor_arguments: String,
    #[serde(rename = "EVMVersion")]
    evm_version: String,
    license_type: String,
    proxy: String,
    implementation: String,
    swarm_source: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CreationItem {
    contract_creator: String,
    tx_hash: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct InternalTxItem {
    from: String,
    to: String,
    #[serde(rename = "type")]
    kind: String,
    contract_address: String,
}

fn non_empty(s: String) -> Option<String> {
    let t = s.trim();
    if t.is_empty() || t.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(t.to_string())
    }
}

fn parse_address(s: &str) -> Option<Address> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse().ok()
}

fn is_empty_result(envelope: &Envelope) -> bool {
    let message = envelope.message.to_lowercase();
    message.starts_with("no ")
        || envelope.result.is_null()
        || envelope.result.as_array().is_some_and(|a| a.is_empty())
}

pub(crate) fn parse_source_response(envelope: Envelope) -> Result<VerifiedSource, SonarError> {
    if !envelope.is_ok() {
        if envelope.result_text().contains(NOT_VERIFIED) || is_empty_result(&envelope) {
            return Ok(VerifiedSource::default());
        }
        return Err(SonarError::Explorer(envelope.describe()));
    }
    let items: Vec<SourceCodeItem> = serde_json::from_value(envelope.result)
        .map_err(|e| SonarError::Explorer(format!("malformed source item: {}", e)))?;
    let item = match items.into_iter().next() {
        Some(item) => item,
        None => return Ok(VerifiedSource::default()),
    };

    let has_source = !item.source_code.trim().is_empty();
    let abi_raw = if item.abi.contains(NOT_VERIFIED) {
        None
    } else {
        non_empty(item.abi)
    };
    Ok(VerifiedSource {
        has_source,
        raw_source: item.source_code,
        abi_raw,
        contract_name: non_empty(item.contract_name),
        compiler: CompilerMetadata {
            compiler_version: non_empty(item.compiler_version),
            optimization: match item.optimization_used.trim() {
                "1" => Some(true),
                "0" => Some(false),
                _ => None,
            },
            runs: item.runs.trim().parse().ok(),
            evm_version: non_empty(item.evm_version),
            license: non_empty(item.license_type),
            constructor_args: non_empty(item.constructor_arguments),
            swarm_source: non_empty(item.swarm_source),
        },
        proxy: item.proxy.trim() == "1",
        implementation: parse_address(&item.implementation),
    })
}

pub(crate) fn parse_abi_response(envelope: Envelope) -> Result<AbiOnly, SonarError> {
    if envelope.is_ok() {
        let abi_raw = non_empty(envelope.result_text().to_string());
        return Ok(AbiOnly {
            has_abi: abi_raw.is_some(),
            abi_raw,
        });
    }
    if envelope.result_text().contains(NOT_VERIFIED) {
        return Ok(AbiOnly::default());
    }
    Err(SonarError::Explorer(envelope.describe()))
}

pub(crate) fn parse_creation_response(
    envelope: Envelope,
) -> Result<Option<CreatorInfo>, SonarError> {
    if !envelope.is_ok() {
        if is_empty_result(&envelope) {
            return Ok(None);
        }
        return Err(SonarError::Explorer(envelope.describe()));
    }
    let items: Vec<CreationItem> = serde_json::from_value(envelope.result)
        .map_err(|e| SonarError::Explorer(format!("malformed creation item: {}", e)))?;
    Ok(items.into_iter().next().and_then(|item| {
        parse_address(&item.contract_creator).map(|creator| CreatorInfo {
            creator,
            creation_tx: item.tx_hash.to_lowercase(),
        })
    }))
}

pub(crate) fn parse_internal_txs_response(
    envelope: Envelope,
) -> Result<Vec<InternalTransaction>, SonarError> {
    if !envelope.is_ok() {
        if is_empty_result(&envelope) {
            return Ok(vec![]);
        }
        return Err(SonarError::Explorer(envelope.describe()));
    }
    let items: Vec<InternalTxItem> = serde_json::from_value(envelope.result)
        .map_err(|e| SonarError::Explorer(format!("malformed internal tx: {}", e)))?;
    Ok(items
        .into_iter()
        .filter_map(|item| {
            let from = parse_address(&item.from)?;
            Some(InternalTransaction {
                from,
                to: parse_address(&item.to),
                kind: item.kind,
                contract_address: parse_address(&item.contract_address),
            })
        })
        .collect())
}

/// [`ExplorerClient`] for Etherscan and API-compatible explorers.
pub struct EtherscanClient {
    fetcher: Fetcher,
}

impl EtherscanClient {
    pub fn new(cfg: &ExplorerConfig) -> Self {
        Self {
            fetcher: Fetcher::new(cfg),
        }
    }
}

#[async_trait]
impl ExplorerClient for EtherscanClient {
    async fn get_verified_source(
        &self,
        address: Address,
    ) -> Result<VerifiedSource, SonarError> {
        debug!(address = canonical(&address), "fetching verified source");
        let envelope = self
            .fetcher
            .get(&[
                ("module", "contract".to_string()),
                ("action", "getsourcecode".to_string()),
                ("address", canonical(&address)),
            ])
            .await?;
        parse_source_response(envelope)
    }

    async fn get_abi_only(&self, address: Address) -> Result<AbiOnly, SonarError> {
        debug!(address = canonical(&address), "fetching abi");
        let envelope = self
            .fetcher
            .get(&[
                ("module", "contract".to_string()),
                ("action", "getabi".to_string()),
                ("address", canonical(&address)),
            ])
            .await?;
        parse_abi_response(envelope)
    }

    async fn get_creator(
        &self,
        address: Address,
    ) -> Result<Option<CreatorInfo>, SonarError> {
        let envelope = self
            .fetcher
            .get(&[
                ("module", "contract".to_string()),
                ("action", "getcontractcreation".to_string()),
                ("contractaddresses", canonical(&address)),
            ])
            .await?;
        parse_creation_response(envelope)
    }

    async fn get_internal_transactions(
        &self,
        address: Address,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<InternalTransaction>, SonarError> {
        let envelope = self
            .fetcher
            .get(&[
                ("module", "account".to_string()),
                ("action", "txlistinternal".to_string()),
                ("address", canonical(&address)),
                ("page", page.to_string()),
                ("offset", page_size.to_string()),
                ("sort", "asc".to_string()),
            ])
            .await?;
        parse_internal_txs_response(envelope)
    }
}
