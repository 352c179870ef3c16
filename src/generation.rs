//! Bounded-retry driver around an [`ImageProvider`].
//!
//! Only retryable failures spend retry budget. Content-policy rejections end
//! the loop at once, since asking again cannot change a policy decision.

use crate::{
    config::RetryPolicy,
    models::{
        EncodedImage, GenerationOutcome, GenerationRequest, ImageGenerationPayload,
        RejectionReason,
    },
    openai::{ImageProvider, ProviderError, ProviderErrorKind},
};
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

const MAX_BACKOFF_SECS: f64 = 60.0;

/// How a provider error should steer the retry loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorClass {
    Rejected(RejectionReason),
    RateLimited(Option<Duration>),
    Retryable,
}

/// The single place where provider errors are mapped onto retry policy.
pub fn classify(error: &ProviderError) -> ErrorClass {
    let message = error.message.to_lowercase();
    if message.contains("safety system") {
        return ErrorClass::Rejected(RejectionReason::Safety);
    }
    if message.contains("content filters") {
        return ErrorClass::Rejected(RejectionReason::ContentFilter);
    }
    if error.code.as_deref() == Some("content_policy_violation") {
        return ErrorClass::Rejected(RejectionReason::Safety);
    }
    match error.kind {
        ProviderErrorKind::RateLimited => ErrorClass::RateLimited(error.retry_after),
        _ => ErrorClass::Retryable,
    }
}

/// `min(60, 2^attempt + jitter)` seconds, `jitter` in `[0, 1)`.
pub fn rate_limit_backoff(attempt: u32, jitter: f64) -> Duration {
    let exp = 2f64.powi(attempt.min(16) as i32);
    Duration::from_secs_f64((exp + jitter).min(MAX_BACKOFF_SECS))
}

/// Waits between attempts. Swappable so tests run without real time passing.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Transient bookkeeping for one `generate` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    pub attempt: u32,
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryState {
    fn new(policy: RetryPolicy) -> Self {
        Self {
            attempt: 0,
            max_attempts: policy.max_attempts.max(1),
            delay: policy.delay,
        }
    }

    fn has_budget(&self) -> bool {
        self.attempt < self.max_attempts
    }
}

#[derive(Clone)]
pub struct GenerationClient {
    provider: Arc<dyn ImageProvider>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    model: String,
    image_count: u32,
}

impl GenerationClient {
    pub fn new(
        provider: Arc<dyn ImageProvider>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
        model: impl Into<String>,
        image_count: u32,
    ) -> Self {
        Self {
            provider,
            sleeper,
            policy,
            model: model.into(),
            image_count: image_count.max(1),
        }
    }

    pub async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        let payload = ImageGenerationPayload::from_request(request, &self.model, self.image_count);
        let mut state = RetryState::new(self.policy);

        while state.has_budget() {
            let mut hinted_delay = None;

            match self.provider.create_image(&payload).await {
                Ok(response) => match response.first_b64() {
                    Some(b64) => {
                        log::info!(
                            "✅ Image generated on attempt {}/{}",
                            state.attempt + 1,
                            state.max_attempts
                        );
                        return GenerationOutcome::Success(EncodedImage::png(b64));
                    }
                    None => log::error!(
                        "❌ Received an empty response from the image provider for prompt '{}'",
                        request.prompt()
                    ),
                },
                Err(error) => match classify(&error) {
                    ErrorClass::Rejected(reason) => {
                        log::error!(
                            "🚫 Prompt '{}' rejected ({}): {}",
                            request.prompt(),
                            reason,
                            error
                        );
                        return GenerationOutcome::ContentRejected(reason);
                    }
                    ErrorClass::RateLimited(hint) => {
                        log::warn!("⚠️  Image provider rate limited the request: {}", error);
                        hinted_delay = Some(hint.unwrap_or_else(|| {
                            let jitter = rand::thread_rng().gen_range(0.0..1.0);
                            rate_limit_backoff(state.attempt + 1, jitter)
                        }));
                    }
                    ErrorClass::Retryable => {
                        log::error!(
                            "❌ Image provider error with prompt '{}': {}",
                            request.prompt(),
                            error
                        );
                    }
                },
            }

            state.attempt += 1;
            if state.has_budget() {
                let delay = hinted_delay.unwrap_or(state.delay);
                log::info!(
                    "🔁 Retrying in {:.1}s (attempt {}/{})",
                    delay.as_secs_f64(),
                    state.attempt + 1,
                    state.max_attempts
                );
                self.sleeper.sleep(delay).await;
            }
        }

        log::error!("❌ All {} retry attempts failed.", state.max_attempts);
        GenerationOutcome::RetriesExhausted
    }
}
