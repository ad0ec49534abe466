use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid ranges, missing advocates, unknown or malformed taxonomies.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Unmapped verdict '{label}' in taxonomy '{taxonomy}'")]
    UnmappedVerdict { label: String, taxonomy: String },

    #[error("Mediator failed: {0}")]
    MediatorFailure(String),

    #[error("Reasoning backend failed: {0}")]
    Backend(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Session cancelled")]
    Cancelled,
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
