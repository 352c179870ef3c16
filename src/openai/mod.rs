pub mod image_client;

use crate::models::{ImageGenerationPayload, ImageResponse};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

pub use image_client::OpenAiImageClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Non-2xx answer other than a rate limit.
    Api { status: u16 },
    RateLimited,
    Transport,
    InvalidResponse,
}

/// Failure reported by the image provider, kept structured so the retry
/// loop can classify it without re-parsing HTTP details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub code: Option<String>,
    pub retry_after: Option<Duration>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            retry_after: None,
        }
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Api { status }, message)
    }

    pub fn rate_limited(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self {
            retry_after,
            ..Self::new(ProviderErrorKind::RateLimited, message)
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidResponse, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ProviderErrorKind::Api { status } => {
                write!(f, "API error ({}): {}", status, self.message)
            }
            ProviderErrorKind::RateLimited => write!(f, "Rate limited: {}", self.message),
            ProviderErrorKind::Transport => write!(f, "Transport error: {}", self.message),
            ProviderErrorKind::InvalidResponse => write!(f, "Invalid response: {}", self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

/// The image-generation backend.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn create_image(
        &self,
        payload: &ImageGenerationPayload,
    ) -> Result<ImageResponse, ProviderError>;
}
