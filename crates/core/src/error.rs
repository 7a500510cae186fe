pub type Result<T, E = SonarError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SonarError {
    #[error("Err not found: {0}")]
    NotFound(String),

    #[error("Err chain provider failure: {0}")]
    Provider(String),

    #[error("Err block explorer failure: {0}")]
    Explorer(String),

    #[error("Err decompiler failure: {0}")]
    Decompiler(String),

    #[error("Err persistence failure: {0}")]
    Persistence(String),

    #[error("Err invalid config: {0}")]
    Config(String),

    #[error("Err: {0}")]
    Custom(String),
}
