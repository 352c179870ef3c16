pub mod config;
pub mod decoder;
pub mod error;
pub mod generation;
pub mod logger;
pub mod models;
pub mod openai;
pub mod orchestrator;
pub mod parser;
pub mod responder;
pub mod slack;

#[cfg(test)]
pub(crate) mod mocks;

pub use config::{BridgeConfig, OpenAiConfig, RetryPolicy, SlackConfig};
pub use decoder::{DecodeFailure, DecodedImage, ImageDecoder};
pub use error::{BridgeError, Result};
pub use generation::GenerationClient;
pub use models::{
    ChatEvent, GenerationOutcome, GenerationRequest, ImageDefaults, ImageQuality, ImageSize,
    ImageStyle, RejectionReason,
};
pub use openai::{ImageProvider, OpenAiImageClient, ProviderError};
pub use orchestrator::{EventOrchestrator, Handling};
pub use parser::RequestParser;
pub use responder::ResponseDirector;
pub use slack::{ChatClient, SlackWebClient, SocketModeListener};
