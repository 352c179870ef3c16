use crate::{
    config::SlackConfig,
    error::{BridgeError, Result},
    models::ChatEvent,
    orchestrator::EventOrchestrator,
    slack::{
        types::{EventsApiPayload, SocketAck, SocketFrame},
        web_client::check_ok,
    },
};
use futures::{SinkExt, StreamExt};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};

const MAX_RECONNECT_DELAY_SECS: u64 = 60;

/// Token problems that no amount of reconnecting will fix.
const FATAL_AUTH_ERRORS: [&str; 5] = [
    "invalid_auth",
    "not_authed",
    "account_inactive",
    "token_revoked",
    "not_allowed_token_type",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameAction {
    Hello,
    Reconnect(String),
    Envelope {
        ack: SocketAck,
        event: Option<ChatEvent>,
    },
    Ignore,
}

/// Decides what to do with one text frame from the socket.
pub fn route_frame(text: &str) -> FrameAction {
    let frame: SocketFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            log::debug!("Failed to parse Socket Mode frame: {} - {}", e, text);
            return FrameAction::Ignore;
        }
    };

    match frame.frame_type.as_str() {
        "hello" => FrameAction::Hello,
        "disconnect" => FrameAction::Reconnect(frame.reason.unwrap_or_else(|| "unknown".into())),
        _ => {
            let envelope_id = match frame.envelope_id {
                Some(id) => id,
                None => return FrameAction::Ignore,
            };
            if let Some(attempt) = frame.retry_attempt.filter(|a| *a > 0) {
                log::debug!("Slack redelivery {} of envelope {}", attempt, envelope_id);
            }
            let event = if frame.frame_type == "events_api" {
                frame
                    .payload
                    .and_then(|p| serde_json::from_value::<EventsApiPayload>(p).ok())
                    .and_then(|p| {
                        log::debug!(
                            "Envelope {} carries {} event {}",
                            envelope_id,
                            p.event.event_type,
                            p.event_id.as_deref().unwrap_or("-")
                        );
                        p.event.into_chat_event()
                    })
            } else {
                None
            };
            FrameAction::Envelope {
                ack: SocketAck { envelope_id },
                event,
            }
        }
    }
}

pub fn reconnect_delay(consecutive_failures: u32) -> Duration {
    let exp = consecutive_failures.saturating_sub(1).min(6);
    Duration::from_secs((1u64 << exp).min(MAX_RECONNECT_DELAY_SECS))
}

fn is_fatal(error: &BridgeError) -> bool {
    matches!(
        error,
        BridgeError::SlackApi { error, .. } if FATAL_AUTH_ERRORS.contains(&error.as_str())
    )
}

/// Receives events over Slack Socket Mode and hands each one to the
/// orchestrator on its own task.
pub struct SocketModeListener {
    client: Client,
    app_token: String,
    api_base: String,
    orchestrator: Arc<EventOrchestrator>,
}

impl SocketModeListener {
    pub fn new(config: &SlackConfig, orchestrator: Arc<EventOrchestrator>) -> Self {
        Self {
            client: Client::new(),
            app_token: config.app_token.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            orchestrator,
        }
    }

    /// Runs until an unrecoverable auth error; transient failures reconnect.
    pub async fn run(&self) -> Result<()> {
        let mut failures: u32 = 0;
        loop {
            match self.session().await {
                Ok(()) => {
                    failures = 0;
                    log::info!("🔄 Socket Mode session ended, reconnecting");
                }
                Err(e) if is_fatal(&e) => {
                    log::error!("❌ Socket Mode cannot authenticate: {}", e);
                    return Err(e);
                }
                Err(e) => {
                    failures += 1;
                    let delay = reconnect_delay(failures);
                    log::error!(
                        "❌ Socket Mode connection failed ({}), retrying in {}s",
                        e,
                        delay.as_secs()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn open_connection(&self) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/api/apps.connections.open", self.api_base))
            .bearer_auth(&self.app_token)
            .send()
            .await
            .map_err(|e| BridgeError::SocketMode(format!("apps.connections.open failed: {}", e)))?;

        let body = check_ok("apps.connections.open", response).await?;
        body["url"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                BridgeError::SocketMode("No URL in apps.connections.open response".into())
            })
    }

    async fn session(&self) -> Result<()> {
        let url = self.open_connection().await?;
        let (socket, _) = connect_async(url.as_str())
            .await
            .map_err(|e| BridgeError::SocketMode(e.to_string()))?;
        log::info!("🔌 Connected to Slack Socket Mode");

        let (mut write, mut read) = socket.split();

        while let Some(message) = read.next().await {
            let message = message.map_err(|e| BridgeError::SocketMode(e.to_string()))?;
            let text = match message {
                Message::Text(text) => text,
                Message::Close(frame) => {
                    let reason = frame.map(|f| f.reason.to_string());
                    log::warn!("⚠️  WebSocket closed: {:?}", reason);
                    return Ok(());
                }
                _ => continue,
            };

            match route_frame(&text) {
                FrameAction::Hello => log::info!("👋 Slack says hello, ready for events"),
                FrameAction::Reconnect(reason) => {
                    log::info!("🔄 Slack requested reconnect: {}", reason);
                    return Ok(());
                }
                FrameAction::Envelope { ack, event } => {
                    // Slack redelivers anything not acked within a few seconds.
                    let ack_json = serde_json::to_string(&ack)?;
                    write
                        .send(Message::Text(ack_json))
                        .await
                        .map_err(|e| {
                            BridgeError::SocketMode(format!("Failed to send ack: {}", e))
                        })?;
                    if let Some(event) = event {
                        self.dispatch(event);
                    }
                }
                FrameAction::Ignore => {}
            }
        }

        log::warn!("⚠️  WebSocket stream ended");
        Ok(())
    }

    fn dispatch(&self, event: ChatEvent) {
        let orchestrator = self.orchestrator.clone();
        tokio::spawn(async move {
            orchestrator.handle(event).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventKind;
    use serde_json::json;

    #[test]
    fn test_hello_and_disconnect_frames() {
        assert_eq!(
            route_frame(r#"{"type":"hello","num_connections":1}"#),
            FrameAction::Hello
        );
        assert_eq!(
            route_frame(r#"{"type":"disconnect","reason":"refresh_requested"}"#),
            FrameAction::Reconnect("refresh_requested".into())
        );
    }

    #[test]
    fn test_events_api_envelope_is_acked_with_event() {
        let text = json!({
            "envelope_id": "env-9",
            "type": "events_api",
            "payload": {
                "event": {
                    "type": "app_mention",
                    "channel": "C1",
                    "ts": "1.0",
                    "text": "<@UBOT> a cat"
                }
            }
        })
        .to_string();

        match route_frame(&text) {
            FrameAction::Envelope { ack, event } => {
                assert_eq!(ack.envelope_id, "env-9");
                let event = event.unwrap();
                assert_eq!(event.kind, EventKind::Mention);
                assert_eq!(event.text, "<@UBOT> a cat");
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_other_envelopes_are_acked_without_event() {
        let slash = json!({
            "envelope_id": "env-2",
            "type": "slash_commands",
            "payload": { "command": "/draw" }
        })
        .to_string();
        assert_eq!(
            route_frame(&slash),
            FrameAction::Envelope {
                ack: SocketAck { envelope_id: "env-2".into() },
                event: None,
            }
        );

        let bot_echo = json!({
            "envelope_id": "env-3",
            "type": "events_api",
            "payload": {
                "event": { "type": "message", "channel": "D1", "ts": "1.0", "bot_id": "B1" }
            }
        })
        .to_string();
        assert_eq!(
            route_frame(&bot_echo),
            FrameAction::Envelope {
                ack: SocketAck { envelope_id: "env-3".into() },
                event: None,
            }
        );
    }

    #[test]
    fn test_garbage_is_ignored() {
        assert_eq!(route_frame("not json"), FrameAction::Ignore);
        assert_eq!(route_frame(r#"{"type":"events_api"}"#), FrameAction::Ignore);
    }

    #[test]
    fn test_reconnect_delay_grows_and_caps() {
        assert_eq!(reconnect_delay(1), Duration::from_secs(1));
        assert_eq!(reconnect_delay(2), Duration::from_secs(2));
        assert_eq!(reconnect_delay(4), Duration::from_secs(8));
        assert_eq!(reconnect_delay(7), Duration::from_secs(60));
        assert_eq!(reconnect_delay(100), Duration::from_secs(60));
    }

    #[test]
    fn test_auth_errors_are_fatal() {
        let auth = BridgeError::SlackApi {
            method: "apps.connections.open".into(),
            error: "invalid_auth".into(),
        };
        assert!(is_fatal(&auth));
        assert!(!is_fatal(&BridgeError::SocketMode("reset".into())));
    }
}
