use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuesterError {
    // Oracle errors
    #[error("Reasoning oracle request failed: {0}")]
    Oracle(String),

    #[error("Retrieval request failed: {0}")]
    Retrieval(String),

    // Flow errors
    #[error("Stage '{stage}' exhausted its retries: {message}")]
    StageExhausted { stage: String, message: String },

    #[error("Flow error: {0}")]
    Flow(String),

    #[error("Run cancelled")]
    Cancelled,

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QuesterError>;
