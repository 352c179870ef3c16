use crate::{
    config::SlackConfig,
    error::{BridgeError, Result},
    slack::ChatClient,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Bot-token client for the handful of Slack Web API methods the bridge uses.
#[derive(Clone)]
pub struct SlackWebClient {
    client: Client,
    bot_token: String,
    api_base: String,
}

impl SlackWebClient {
    pub fn new(config: &SlackConfig) -> Self {
        Self {
            client: Client::new(),
            bot_token: config.bot_token.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/api/{}", self.api_base, method)
    }

    async fn call_json(&self, method: &str, body: Value) -> Result<Value> {
        let response = self
            .client
            .post(self.method_url(method))
            .bearer_auth(&self.bot_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| BridgeError::RequestError(format!("{} request failed: {}", method, e)))?;

        check_ok(method, response).await
    }
}

/// Slack reports most failures as `200 {"ok": false, "error": "..."}`.
pub(crate) async fn check_ok(method: &str, response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let body: Value = response.json().await.map_err(|e| {
        BridgeError::ResponseError(format!(
            "{} returned an unreadable body ({}): {}",
            method, status, e
        ))
    })?;

    if body["ok"].as_bool().unwrap_or(false) {
        Ok(body)
    } else {
        Err(BridgeError::SlackApi {
            method: method.to_string(),
            error: body["error"].as_str().unwrap_or("unknown_error").to_string(),
        })
    }
}

#[async_trait]
impl ChatClient for SlackWebClient {
    async fn add_reaction(&self, channel: &str, timestamp: &str, name: &str) -> Result<()> {
        self.call_json(
            "reactions.add",
            json!({ "channel": channel, "timestamp": timestamp, "name": name }),
        )
        .await
        .map(|_| ())
    }

    async fn remove_reaction(&self, channel: &str, timestamp: &str, name: &str) -> Result<()> {
        self.call_json(
            "reactions.remove",
            json!({ "channel": channel, "timestamp": timestamp, "name": name }),
        )
        .await
        .map(|_| ())
    }

    async fn post_message(&self, channel: &str, thread_ts: &str, text: &str) -> Result<()> {
        self.call_json(
            "chat.postMessage",
            json!({ "channel": channel, "thread_ts": thread_ts, "text": text }),
        )
        .await
        .map(|_| ())
    }

    /// External upload flow: reserve an upload URL, send the bytes, then
    /// share the file into the thread.
    async fn upload_file(
        &self,
        channel: &str,
        thread_ts: &str,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<()> {
        let length = bytes.len().to_string();
        let response = self
            .client
            .post(self.method_url("files.getUploadURLExternal"))
            .bearer_auth(&self.bot_token)
            .form(&[("filename", filename), ("length", length.as_str())])
            .send()
            .await
            .map_err(|e| {
                BridgeError::RequestError(format!(
                    "files.getUploadURLExternal request failed: {}",
                    e
                ))
            })?;
        let reserved = check_ok("files.getUploadURLExternal", response).await?;

        let upload_url = reserved["upload_url"].as_str().ok_or_else(|| {
            BridgeError::ResponseError("missing upload_url in Slack response".into())
        })?;
        let file_id = reserved["file_id"]
            .as_str()
            .ok_or_else(|| BridgeError::ResponseError("missing file_id in Slack response".into()))?;

        let upload = self
            .client
            .post(upload_url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| BridgeError::RequestError(format!("file upload failed: {}", e)))?;
        if !upload.status().is_success() {
            return Err(BridgeError::ResponseError(format!(
                "file upload returned {}",
                upload.status()
            )));
        }

        self.call_json(
            "files.completeUploadExternal",
            json!({
                "files": [{ "id": file_id, "title": filename }],
                "channel_id": channel,
                "thread_ts": thread_ts,
            }),
        )
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SlackWebClient {
        SlackWebClient::new(&SlackConfig::new("xoxb-test", "xapp-test").with_api_base(server.uri()))
    }

    fn ok() -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "ok": true }))
    }

    #[tokio::test]
    async fn test_add_reaction_sends_expected_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/reactions.add"))
            .and(header("authorization", "Bearer xoxb-test"))
            .and(body_json(json!({ "channel": "C1", "timestamp": "1.5", "name": "x" })))
            .respond_with(ok())
            .expect(1)
            .mount(&server)
            .await;

        client(&server).add_reaction("C1", "1.5", "x").await.unwrap();
    }

    #[tokio::test]
    async fn test_not_ok_becomes_slack_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/reactions.remove"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "ok": false, "error": "no_reaction" })),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .remove_reaction("C1", "1.5", "hourglass_flowing_sand")
            .await
            .unwrap_err();
        match err {
            BridgeError::SlackApi { method, error } => {
                assert_eq!(method, "reactions.remove");
                assert_eq!(error, "no_reaction");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_post_message_threads_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat.postMessage"))
            .and(body_json(json!({ "channel": "C1", "thread_ts": "1.5", "text": "hello" })))
            .respond_with(ok())
            .expect(1)
            .mount(&server)
            .await;

        client(&server).post_message("C1", "1.5", "hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_upload_runs_three_step_flow() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/files.getUploadURLExternal"))
            .and(body_string_contains("filename=generated_image.png"))
            .and(body_string_contains("length=4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "upload_url": format!("{}/upload/F1", server.uri()),
                "file_id": "F1"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/upload/F1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/files.completeUploadExternal"))
            .and(body_json(json!({
                "files": [{ "id": "F1", "title": "generated_image.png" }],
                "channel_id": "C1",
                "thread_ts": "1.5"
            })))
            .respond_with(ok())
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .upload_file("C1", "1.5", vec![1, 2, 3, 4], "generated_image.png")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upload_stops_when_reservation_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/files.getUploadURLExternal"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "ok": false, "error": "not_authed" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/files.completeUploadExternal"))
            .respond_with(ok())
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server)
            .upload_file("C1", "1.5", vec![1], "generated_image.png")
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::SlackApi { .. }));
    }
}
