use providers::ProviderError;
use thiserror::Error;

/// Failures confined to the command or screen that triggered them.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Network(#[from] ProviderError),
    #[error("missing data: {0}")]
    MissingData(String),
    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    pub fn missing(what: impl Into<String>) -> Self {
        AppError::MissingData(what.into())
    }
}
