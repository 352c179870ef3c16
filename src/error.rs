use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Response error: {0}")]
    ResponseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Slack API error on {method}: {error}")]
    SlackApi { method: String, error: String },
    #[error("Socket Mode error: {0}")]
    SocketMode(String),
    #[error("Logger error: {0}")]
    LoggerError(String),
}

impl From<reqwest::Error> for BridgeError {
    fn from(e: reqwest::Error) -> Self {
        BridgeError::RequestError(e.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(e: serde_json::Error) -> Self {
        BridgeError::SerializationError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
