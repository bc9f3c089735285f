use sitesurvey_core::CoreError;
use sitesurvey_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown screen: {0}")]
    UnknownScreen(String),

    #[error("{} required field(s) blank", .missing.len())]
    Validation { missing: Vec<(usize, String)> },
}
