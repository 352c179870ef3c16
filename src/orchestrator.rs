//! Per-event driver.
//!
//! `Start -> WorkingIndicatorOn -> Parse -> Generate -> Decode (on success)
//! -> ResponseDirector -> WorkingIndicatorOff -> Done`

use crate::{
    config::BridgeConfig,
    decoder::ImageDecoder,
    generation::{GenerationClient, TokioSleeper},
    logger,
    models::{ChatEvent, GenerationOutcome},
    openai::ImageProvider,
    parser::RequestParser,
    responder::ResponseDirector,
    slack::{ChatClient, WORKING_REACTION},
};
use std::sync::Arc;
use uuid::Uuid;

/// What happened to one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handling {
    Ignored,
    Handled(GenerationOutcome),
}

pub struct EventOrchestrator {
    parser: RequestParser,
    generator: GenerationClient,
    decoder: ImageDecoder,
    director: ResponseDirector,
    chat: Arc<dyn ChatClient>,
}

impl EventOrchestrator {
    pub fn new(
        parser: RequestParser,
        generator: GenerationClient,
        chat: Arc<dyn ChatClient>,
    ) -> Self {
        Self {
            parser,
            generator,
            decoder: ImageDecoder::new(),
            director: ResponseDirector::new(chat.clone()),
            chat,
        }
    }

    /// Wires the production pipeline from loaded configuration.
    pub fn from_config(
        config: &BridgeConfig,
        provider: Arc<dyn ImageProvider>,
        chat: Arc<dyn ChatClient>,
    ) -> Self {
        let generator = GenerationClient::new(
            provider,
            Arc::new(TokioSleeper),
            config.retry,
            config.openai.model.clone(),
            config.image_count,
        );
        Self::new(RequestParser::new(config.defaults), generator, chat)
    }

    pub async fn handle(&self, event: ChatEvent) -> Handling {
        if !event.is_actionable() {
            log::debug!(
                "Ignoring {:?} event in {:?} conversation {}",
                event.kind,
                event.conversation,
                event.channel
            );
            return Handling::Ignored;
        }

        let request_id = Uuid::new_v4().to_string();
        let request_id = &request_id[..8];
        let thread = event.thread();
        log::info!(
            "📨 [{}] {:?} in {} at {}: {}",
            request_id,
            event.kind,
            thread.channel,
            thread.ts,
            event.text
        );

        if let Err(e) = self
            .chat
            .add_reaction(&thread.channel, &thread.ts, WORKING_REACTION)
            .await
        {
            log::warn!("⚠️  [{}] Could not add working reaction: {}", request_id, e);
        }

        let request = self.parser.parse(&event.text);
        log::info!(
            "🎨 [{}] prompt='{}' size={} style={} quality={}",
            request_id,
            request.prompt(),
            request.size(),
            request.style(),
            request.quality()
        );

        let outcome = {
            let _timer = logger::timer("image generation");
            self.generator.generate(&request).await
        };

        let image = match &outcome {
            GenerationOutcome::Success(encoded) => {
                Some(self.decoder.decode_blocking(encoded.clone()).await)
            }
            _ => None,
        };

        self.director.respond(&thread, &outcome, image).await;

        if let Err(e) = self
            .chat
            .remove_reaction(&thread.channel, &thread.ts, WORKING_REACTION)
            .await
        {
            log::warn!("⚠️  [{}] Could not remove working reaction: {}", request_id, e);
        }

        log::info!("🏁 [{}] Finished with outcome {}", request_id, outcome.label());
        Handling::Handled(outcome)
    }
}
