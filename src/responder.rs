//! Maps a terminal outcome onto the reactions and replies the user sees.
//!
//! Every chat call here is fire-and-forget: a failure is logged and the
//! sequence carries on. Nothing is returned to the caller.

use crate::{
    decoder::{DecodeFailure, DecodedImage, UPLOAD_FILENAME},
    models::{GenerationOutcome, ThreadRef},
    slack::{ChatClient, FAILURE_REACTION, SUCCESS_REACTION},
};
use std::sync::Arc;

pub const UPLOAD_FAILED_MESSAGE: &str = "Failed to upload image to Slack.";
pub const DECODE_FAILED_MESSAGE: &str = "Failed to convert base64 data to image.";
pub const CONTENT_REJECTED_MESSAGE: &str =
    "Your request was not processed due to content restrictions. Please try a different prompt.";
pub const RETRIES_EXHAUSTED_MESSAGE: &str =
    "Failed to generate image after several attempts. Please try again later.";

#[derive(Clone)]
pub struct ResponseDirector {
    chat: Arc<dyn ChatClient>,
}

impl ResponseDirector {
    pub fn new(chat: Arc<dyn ChatClient>) -> Self {
        Self { chat }
    }

    /// `image` is the decoder's verdict and is only meaningful for `Success`;
    /// a success without one is treated as undecodable.
    pub async fn respond(
        &self,
        thread: &ThreadRef,
        outcome: &GenerationOutcome,
        image: Option<Result<DecodedImage, DecodeFailure>>,
    ) {
        match outcome {
            GenerationOutcome::Success(_) => match image {
                Some(Ok(image)) => self.deliver(thread, image).await,
                Some(Err(_)) | None => self.fail(thread, DECODE_FAILED_MESSAGE).await,
            },
            GenerationOutcome::ContentRejected(_) => {
                self.fail(thread, CONTENT_REJECTED_MESSAGE).await
            }
            GenerationOutcome::RetriesExhausted => {
                self.fail(thread, RETRIES_EXHAUSTED_MESSAGE).await
            }
            GenerationOutcome::ProviderError(message) => {
                self.fail(thread, &format!("Failed to generate image: {}", message))
                    .await
            }
        }
    }

    async fn deliver(&self, thread: &ThreadRef, image: DecodedImage) {
        match self
            .chat
            .upload_file(&thread.channel, &thread.ts, image.png, UPLOAD_FILENAME)
            .await
        {
            Ok(()) => {
                log::info!("📤 Uploaded image to {} (thread {})", thread.channel, thread.ts);
                self.react(thread, SUCCESS_REACTION).await;
            }
            Err(e) => {
                log::error!("❌ Error uploading to Slack: {}", e);
                self.fail(thread, UPLOAD_FAILED_MESSAGE).await;
            }
        }
    }

    async fn fail(&self, thread: &ThreadRef, message: &str) {
        self.react(thread, FAILURE_REACTION).await;
        if let Err(e) = self.chat.post_message(&thread.channel, &thread.ts, message).await {
            log::error!("❌ Error posting message: {}", e);
        }
    }

    async fn react(&self, thread: &ThreadRef, name: &str) {
        if let Err(e) = self.chat.add_reaction(&thread.channel, &thread.ts, name).await {
            log::error!("❌ Error adding reaction '{}': {}", name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{ChatCall, RecordingChat};
    use crate::models::{EncodedImage, RejectionReason};

    fn thread() -> ThreadRef {
        ThreadRef {
            channel: "C1".into(),
            ts: "1.0".into(),
        }
    }

    fn image() -> DecodedImage {
        DecodedImage {
            png: vec![1, 2, 3],
            width: 1,
            height: 1,
        }
    }

    fn success() -> GenerationOutcome {
        GenerationOutcome::Success(EncodedImage::png("AQID"))
    }

    #[tokio::test]
    async fn test_success_uploads_then_frames() {
        let chat = Arc::new(RecordingChat::default());
        ResponseDirector::new(chat.clone())
            .respond(&thread(), &success(), Some(Ok(image())))
            .await;

        assert_eq!(
            chat.calls(),
            vec![
                ChatCall::upload("C1", "1.0", 3, "generated_image.png"),
                ChatCall::reaction("C1", "1.0", "frame_with_picture"),
            ]
        );
    }

    #[tokio::test]
    async fn test_upload_failure_reports() {
        let chat = Arc::new(RecordingChat::default().failing_uploads());
        ResponseDirector::new(chat.clone())
            .respond(&thread(), &success(), Some(Ok(image())))
            .await;

        let calls = chat.calls();
        assert!(calls.contains(&ChatCall::reaction("C1", "1.0", "x")));
        assert!(calls.contains(&ChatCall::message("C1", "1.0", UPLOAD_FAILED_MESSAGE)));
        assert!(!calls.contains(&ChatCall::reaction("C1", "1.0", "frame_with_picture")));
    }

    #[tokio::test]
    async fn test_decode_failure_reports() {
        let chat = Arc::new(RecordingChat::default());
        ResponseDirector::new(chat.clone())
            .respond(
                &thread(),
                &success(),
                Some(Err(DecodeFailure::Raster("unknown format".into()))),
            )
            .await;

        assert_eq!(
            chat.calls(),
            vec![
                ChatCall::reaction("C1", "1.0", "x"),
                ChatCall::message("C1", "1.0", DECODE_FAILED_MESSAGE),
            ]
        );
    }

    #[tokio::test]
    async fn test_content_rejection_reports() {
        for reason in [RejectionReason::Safety, RejectionReason::ContentFilter] {
            let chat = Arc::new(RecordingChat::default());
            ResponseDirector::new(chat.clone())
                .respond(&thread(), &GenerationOutcome::ContentRejected(reason), None)
                .await;

            assert_eq!(
                chat.calls(),
                vec![
                    ChatCall::reaction("C1", "1.0", "x"),
                    ChatCall::message("C1", "1.0", CONTENT_REJECTED_MESSAGE),
                ]
            );
        }
    }

    #[tokio::test]
    async fn test_retries_exhausted_reports_even_if_reaction_fails() {
        let chat = Arc::new(RecordingChat::default().failing_reactions());
        ResponseDirector::new(chat.clone())
            .respond(&thread(), &GenerationOutcome::RetriesExhausted, None)
            .await;

        assert_eq!(
            chat.calls(),
            vec![
                ChatCall::reaction("C1", "1.0", "x"),
                ChatCall::message("C1", "1.0", RETRIES_EXHAUSTED_MESSAGE),
            ]
        );
    }

    #[tokio::test]
    async fn test_provider_error_reports_message() {
        let chat = Arc::new(RecordingChat::default().failing_messages());
        ResponseDirector::new(chat.clone())
            .respond(
                &thread(),
                &GenerationOutcome::ProviderError("model not found".into()),
                None,
            )
            .await;

        assert_eq!(
            chat.calls(),
            vec![
                ChatCall::reaction("C1", "1.0", "x"),
                ChatCall::message("C1", "1.0", "Failed to generate image: model not found"),
            ]
        );
    }
}
