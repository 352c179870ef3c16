use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectionReason {
    Safety,
    ContentFilter,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::Safety => f.write_str("safety"),
            RejectionReason::ContentFilter => f.write_str("content-filter"),
        }
    }
}

/// Provider payload that still carries its transport encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub b64_json: String,
    pub mime_hint: &'static str,
}

impl EncodedImage {
    pub fn png(b64_json: impl Into<String>) -> Self {
        Self {
            b64_json: b64_json.into(),
            mime_hint: "png",
        }
    }
}

/// Terminal result of one generation attempt sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success(EncodedImage),
    ContentRejected(RejectionReason),
    RetriesExhausted,
    ProviderError(String),
}

impl GenerationOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            GenerationOutcome::Success(_) => "success",
            GenerationOutcome::ContentRejected(_) => "content-rejected",
            GenerationOutcome::RetriesExhausted => "retries-exhausted",
            GenerationOutcome::ProviderError(_) => "provider-error",
        }
    }
}
