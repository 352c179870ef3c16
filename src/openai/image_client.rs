use crate::{
    config::OpenAiConfig,
    models::{ImageGenerationPayload, ImageResponse},
    openai::{ImageProvider, ProviderError},
};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiImageClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiImageClient {
    pub fn new(config: &OpenAiConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &OpenAiConfig) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/images/generations", self.base_url)
    }
}

/// `Retry-After` in whole seconds. HTTP-date values are ignored.
fn retry_after(headers: &header::HeaderMap) -> Option<Duration> {
    headers
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn error_from_body(status: StatusCode, retry: Option<Duration>, body: &str) -> ProviderError {
    let (message, code) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.message, envelope.error.code),
        Err(_) => (body.trim().to_string(), None),
    };
    let message = if message.is_empty() {
        status.to_string()
    } else {
        message
    };

    let error = if status == StatusCode::TOO_MANY_REQUESTS {
        ProviderError::rate_limited(message, retry)
    } else {
        ProviderError::api(status.as_u16(), message)
    };

    match code {
        Some(code) => error.with_code(code),
        None => error,
    }
}

#[async_trait]
impl ImageProvider for OpenAiImageClient {
    async fn create_image(
        &self,
        payload: &ImageGenerationPayload,
    ) -> Result<ImageResponse, ProviderError> {
        log::info!(
            "🎨 Requesting {} image(s) from {} ({}, {}, {})",
            payload.n,
            payload.model,
            payload.size,
            payload.style,
            payload.quality
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| ProviderError::transport(format!("OpenAI request failed: {}", e)))?;

        let status = response.status();
        let retry = retry_after(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| {
                ProviderError::transport(format!("Failed to read OpenAI response: {}", e))
            })?;

        if !status.is_success() {
            return Err(error_from_body(status, retry, &body));
        }

        log::debug!("OpenAI image response: {} bytes", body.len());

        serde_json::from_str::<ImageResponse>(&body)
            .map_err(|e| ProviderError::invalid_response(e.to_string()))
    }
}
