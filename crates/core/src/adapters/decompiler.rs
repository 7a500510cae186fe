use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::SonarError;
use crate::types::{Address, Bytes};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decompilation {
    pub success: bool,
    pub decompiled_text: Option<String>,
    pub method: Option<String>,
    /// the decompiler produced output but flagged it as unusable source
    pub no_source: bool,
    pub error: Option<String>,
}

impl Decompilation {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

#[automock]
#[async_trait]
pub trait Decompiler: Send + Sync {
    async fn decompile(
        &self,
        address: Address,
        bytecode: Bytes,
    ) -> Result<Decompilation, SonarError>;
}

/// Decompiler used when none is configured. Always reports a failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDecompiler;

#[async_trait]
impl Decompiler for NullDecompiler {
    async fn decompile(
        &self,
        _address: Address,
        _bytecode: Bytes,
    ) -> Result<Decompilation, SonarError> {
        Ok(Decompilation::failed("no decompiler configured"))
    }
}
