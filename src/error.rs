use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Correlation analysis for '{subject}' was cancelled")]
    Cancelled { subject: String },

    #[error("Background worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

pub type EngineResult<T> = Result<T, EngineError>;
