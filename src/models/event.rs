use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// `app_mention`
    Mention,
    /// `message`
    Message,
    Other(String),
}

impl EventKind {
    pub fn from_slack_type(event_type: &str) -> Self {
        match event_type {
            "app_mention" => EventKind::Mention,
            "message" => EventKind::Message,
            other => EventKind::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationType {
    DirectMessage,
    Channel,
    PrivateGroup,
    MultiPartyDirect,
    Unknown,
}

impl ConversationType {
    pub fn from_slack_channel_type(channel_type: Option<&str>) -> Self {
        match channel_type {
            Some("im") => ConversationType::DirectMessage,
            Some("channel") => ConversationType::Channel,
            Some("group") => ConversationType::PrivateGroup,
            Some("mpim") => ConversationType::MultiPartyDirect,
            _ => ConversationType::Unknown,
        }
    }
}

/// A chat event as delivered to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEvent {
    pub kind: EventKind,
    pub channel: String,
    pub ts: String,
    pub conversation: ConversationType,
    pub text: String,
}

impl ChatEvent {
    pub fn mention(
        channel: impl Into<String>,
        ts: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            kind: EventKind::Mention,
            channel: channel.into(),
            ts: ts.into(),
            conversation: ConversationType::Channel,
            text: text.into(),
        }
    }

    pub fn direct_message(
        channel: impl Into<String>,
        ts: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            kind: EventKind::Message,
            channel: channel.into(),
            ts: ts.into(),
            conversation: ConversationType::DirectMessage,
            text: text.into(),
        }
    }

    /// Mentions are always handled; plain messages only inside a DM.
    pub fn is_actionable(&self) -> bool {
        match self.kind {
            EventKind::Mention => true,
            EventKind::Message => self.conversation == ConversationType::DirectMessage,
            EventKind::Other(_) => false,
        }
    }

    /// Where replies for this event go: its channel, threaded under its timestamp.
    pub fn thread(&self) -> ThreadRef {
        ThreadRef {
            channel: self.channel.clone(),
            ts: self.ts.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThreadRef {
    pub channel: String,
    pub ts: String,
}
