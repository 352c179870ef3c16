//! In-memory stand-ins for the provider, the clock and the chat client.

use crate::{
    error::{BridgeError, Result},
    generation::Sleeper,
    models::{ImageData, ImageGenerationPayload, ImageResponse},
    openai::{ImageProvider, ProviderError},
    slack::ChatClient,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, Rgb, RgbImage};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

/// Base64 of a real 2x2 PNG.
pub fn sample_png_b64() -> String {
    let image = RgbImage::from_fn(2, 2, |x, y| Rgb([(x * 200) as u8, (y * 200) as u8, 90]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    STANDARD.encode(bytes)
}

/// Replays a fixed script of provider answers. Once the script runs dry
/// every further call fails with a transport error.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<std::result::Result<ImageResponse, ProviderError>>>,
    payloads: Mutex<Vec<ImageGenerationPayload>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<std::result::Result<ImageResponse, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn image(b64: &str) -> ImageResponse {
        ImageResponse {
            created: 1_700_000_000,
            data: vec![ImageData {
                b64_json: Some(b64.to_string()),
                url: None,
                revised_prompt: None,
            }],
        }
    }

    pub fn calls(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }

    pub fn payloads(&self) -> Vec<ImageGenerationPayload> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageProvider for ScriptedProvider {
    async fn create_image(
        &self,
        payload: &ImageGenerationPayload,
    ) -> std::result::Result<ImageResponse, ProviderError> {
        self.payloads.lock().unwrap().push(payload.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::transport("script exhausted")))
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCall {
    AddReaction { channel: String, ts: String, name: String },
    RemoveReaction { channel: String, ts: String, name: String },
    PostMessage { channel: String, thread_ts: String, text: String },
    Upload { channel: String, thread_ts: String, len: usize, filename: String },
}

impl ChatCall {
    pub fn reaction(channel: &str, ts: &str, name: &str) -> Self {
        ChatCall::AddReaction {
            channel: channel.into(),
            ts: ts.into(),
            name: name.into(),
        }
    }

    pub fn unreaction(channel: &str, ts: &str, name: &str) -> Self {
        ChatCall::RemoveReaction {
            channel: channel.into(),
            ts: ts.into(),
            name: name.into(),
        }
    }

    pub fn message(channel: &str, thread_ts: &str, text: &str) -> Self {
        ChatCall::PostMessage {
            channel: channel.into(),
            thread_ts: thread_ts.into(),
            text: text.into(),
        }
    }

    pub fn upload(channel: &str, thread_ts: &str, len: usize, filename: &str) -> Self {
        ChatCall::Upload {
            channel: channel.into(),
            thread_ts: thread_ts.into(),
            len,
            filename: filename.into(),
        }
    }
}

/// Records every outbound call in order. Each kind of call can be told to
/// fail; failed calls are still recorded.
#[derive(Default)]
pub struct RecordingChat {
    calls: Mutex<Vec<ChatCall>>,
    fail_reactions: bool,
    fail_messages: bool,
    fail_uploads: bool,
}

impl RecordingChat {
    pub fn failing_reactions(mut self) -> Self {
        self.fail_reactions = true;
        self
    }

    pub fn failing_messages(mut self) -> Self {
        self.fail_messages = true;
        self
    }

    pub fn failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    pub fn calls(&self) -> Vec<ChatCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ChatCall, fail: bool, method: &str) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if fail {
            Err(BridgeError::SlackApi {
                method: method.to_string(),
                error: "ratelimited".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ChatClient for RecordingChat {
    async fn add_reaction(&self, channel: &str, timestamp: &str, name: &str) -> Result<()> {
        self.record(
            ChatCall::reaction(channel, timestamp, name),
            self.fail_reactions,
            "reactions.add",
        )
    }

    async fn remove_reaction(&self, channel: &str, timestamp: &str, name: &str) -> Result<()> {
        self.record(
            ChatCall::unreaction(channel, timestamp, name),
            self.fail_reactions,
            "reactions.remove",
        )
    }

    async fn post_message(&self, channel: &str, thread_ts: &str, text: &str) -> Result<()> {
        self.record(
            ChatCall::message(channel, thread_ts, text),
            self.fail_messages,
            "chat.postMessage",
        )
    }

    async fn upload_file(
        &self,
        channel: &str,
        thread_ts: &str,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<()> {
        self.record(
            ChatCall::upload(channel, thread_ts, bytes.len(), filename),
            self.fail_uploads,
            "files.completeUploadExternal",
        )
    }
}
