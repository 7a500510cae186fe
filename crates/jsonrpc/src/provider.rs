use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use libsonar_core::{
    adapters::ChainReader,
    error::SonarError,
    types::{canonical, hex, Address, Bytes, B256},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

/// Chain reader talking plain JSON-RPC over HTTP, always at `latest`.
pub struct JsonRpcProvider {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcProvider {
    pub fn new(url: String) -> Result<Self, SonarError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SonarError::Config(format!(
                "unsupported jsonrpc url: {}",
                url
            )));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            url,
            next_id: AtomicU64::new(1),
        })
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, SonarError> {
        let req = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        let resp = self
            .client
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| SonarError::Provider(format!("{} failed: {}", method, e)))?;
        let resp: JsonRpcResponse = resp
            .json()
            .await
            .map_err(|e| SonarError::Provider(format!("{} bad response: {}", method, e)))?;
        if let Some(err) = resp.error {
            return Err(SonarError::Provider(format!(
                "{} returned error {}: {}",
                method, err.code, err.message
            )));
        }
        Ok(resp.result.unwrap_or(Value::Null))
    }
}

fn hex_str(value: &Value) -> Result<&str, SonarError> {
    match value {
        Value::String(s) => Ok(s.strip_prefix("0x").unwrap_or(s)),
        Value::Null => Ok(""),
        _ => Err(SonarError::Provider(format!(
            "expected hex string, got {}",
            value
        ))),
    }
}

pub(crate) fn parse_bytecode(value: &Value) -> Result<Bytes, SonarError> {
    let s = hex_str(value)?;
    hex::decode(s)
        .map(Bytes::from)
        .map_err(|e| SonarError::Provider(format!("invalid bytecode hex: {}", e)))
}

pub(crate) fn parse_slot(value: &Value) -> Result<B256, SonarError> {
    let s = hex_str(value)?;
    if s.len() > 64 {
        return Err(SonarError::Provider(format!(
            "storage value longer than 32 bytes: 0x{}",
            s
        )));
    }
    // some nodes return compact quantities, e.g. "0x0"
    let padded = format!("{:0>64}", s);
    let bytes = hex::decode(padded)
        .map_err(|e| SonarError::Provider(format!("invalid storage hex: {}", e)))?;
    Ok(B256::from_slice(&bytes))
}

#[async_trait]
impl ChainReader for JsonRpcProvider {
    async fn get_bytecode(&self, address: Address) -> Result<Bytes, SonarError> {
        let result = self
            .request("eth_getCode", json!([canonical(&address), "latest"]))
            .await?;
        parse_bytecode(&result)
    }

    async fn read_storage_slot(
        &self,
        address: Address,
        slot: B256,
    ) -> Result<B256, SonarError> {
        let result = self
            .request(
                "eth_getStorageAt",
                json!([canonical(&address), format!("0x{}", hex::encode(slot)), "latest"]),
            )
            .await?;
        parse_slot(&result)
    }
}
