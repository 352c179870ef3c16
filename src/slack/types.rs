//! Socket Mode wire types.

use crate::models::{ChatEvent, ConversationType, EventKind};
use serde::{Deserialize, Serialize};

/// Any frame Slack pushes over the socket.
#[derive(Debug, Clone, Deserialize)]
pub struct SocketFrame {
    #[serde(rename = "type")]
    pub frame_type: String,
    #[serde(default)]
    pub envelope_id: Option<String>,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub retry_attempt: Option<u32>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SocketAck {
    pub envelope_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventsApiPayload {
    #[serde(default)]
    pub event_id: Option<String>,
    pub event: SlackEvent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub channel_type: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
}

impl SlackEvent {
    /// Bot-authored posts and subtyped messages (edits, joins, file shares)
    /// are dropped so the bridge never answers its own output.
    pub fn into_chat_event(self) -> Option<ChatEvent> {
        if self.bot_id.is_some() || self.subtype.is_some() {
            return None;
        }
        Some(ChatEvent {
            kind: EventKind::from_slack_type(&self.event_type),
            channel: self.channel?,
            ts: self.ts?,
            conversation: ConversationType::from_slack_channel_type(self.channel_type.as_deref()),
            text: self.text.unwrap_or_default(),
        })
    }
}
