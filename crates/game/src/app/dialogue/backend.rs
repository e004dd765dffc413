use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use super::{ChatMessage, DialogueError, DialogueSource};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct DialogueReply {
    success: bool,
    #[serde(default)]
    messages: Vec<ChatMessage>,
    #[serde(default)]
    cached: bool,
    #[serde(default)]
    fallback: bool,
    #[serde(default)]
    error: Option<String>,
}

/// NPC lines served by the dialogue backend at `GET {base_url}/dialogue`.
///
/// Any failure (transport, timeout, status, body, or `success: false`) answers with the
/// NPC's emergency lines instead.
#[derive(Debug, Clone)]
pub(crate) struct BackendDialogue {
    npc_name: String,
    endpoint: String,
    client: reqwest::Client,
    emergency_lines: Vec<ChatMessage>,
}

impl BackendDialogue {
    pub(crate) fn new(
        npc_name: &str,
        base_url: &str,
        emergency_lines: Vec<ChatMessage>,
    ) -> Result<Self, DialogueError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(DialogueError::Client)?;
        Ok(Self {
            npc_name: npc_name.to_string(),
            endpoint: format!("{}/dialogue", base_url.trim_end_matches('/')),
            client,
            emergency_lines,
        })
    }

    pub(crate) fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn try_fetch(&self) -> Result<Vec<ChatMessage>, DialogueError> {
        let response = self
            .client
            .get(&self.endpoint)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(DialogueError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DialogueError::Status { status });
        }
        let body = response.text().await.map_err(DialogueError::Request)?;
        let reply = parse_reply(&body)?;
        if !reply.success {
            return Err(DialogueError::Rejected(
                reply.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        info!(
            npc = self.npc_name.as_str(),
            message_count = reply.messages.len(),
            cached = reply.cached,
            fallback = reply.fallback,
            "dialogue_backend_answered"
        );
        Ok(reply.messages)
    }
}

#[async_trait]
impl DialogueSource for BackendDialogue {
    fn npc_name(&self) -> &str {
        &self.npc_name
    }

    async fn fetch_dialogue(&self) -> Vec<ChatMessage> {
        match self.try_fetch().await {
            Ok(messages) => messages,
            Err(error) => {
                warn!(
                    npc = self.npc_name.as_str(),
                    endpoint = self.endpoint.as_str(),
                    error = %error,
                    "dialogue_backend_failed"
                );
                self.emergency_lines.clone()
            }
        }
    }
}

fn parse_reply(raw: &str) -> Result<DialogueReply, DialogueError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, DialogueReply>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        DialogueError::Parse {
            path,
            source: error.into_inner(),
        }
    })
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    fn emergency() -> Vec<ChatMessage> {
        vec![ChatMessage::new("Sally", "Oh my, another visitor!", Some(3000))]
    }

    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request).await;
            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        });
        format!("http://{address}/api/sally")
    }

    #[test]
    fn endpoint_appends_dialogue_path_once() {
        let source =
            BackendDialogue::new("Sally", "http://localhost:3000/api/sally/", emergency())
                .expect("client");
        assert_eq!(source.endpoint(), "http://localhost:3000/api/sally/dialogue");
    }

    #[test]
    fn parse_reports_path_of_malformed_field() {
        let error = parse_reply(r#"{"success":true,"messages":[{"speaker":"Sally","text":7}]}"#)
            .expect_err("malformed");
        match error {
            DialogueError::Parse { path, .. } => assert_eq!(path, "messages[0].text"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn parse_defaults_optional_flags() {
        let reply = parse_reply(r#"{"success":false,"error":"model offline"}"#).expect("reply");
        assert!(!reply.success);
        assert!(reply.messages.is_empty());
        assert!(!reply.cached);
        assert!(!reply.fallback);
        assert_eq!(reply.error.as_deref(), Some("model offline"));
    }

    #[tokio::test]
    async fn successful_reply_returns_backend_messages() {
        let base = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"success":true,"cached":true,"fallback":false,"messages":[{"speaker":"Sally","text":"Seashells!","duration":2500}]}"#,
        )
        .await;
        let source = BackendDialogue::new("Sally", &base, emergency()).expect("client");

        let messages = source.fetch_dialogue().await;
        assert_eq!(
            messages,
            vec![ChatMessage::new("Sally", "Seashells!", Some(2500))]
        );
    }

    #[tokio::test]
    async fn rejected_reply_uses_emergency_lines() {
        let base = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"success":false,"error":"quota exceeded"}"#,
        )
        .await;
        let source = BackendDialogue::new("Sally", &base, emergency()).expect("client");

        assert_eq!(source.fetch_dialogue().await, emergency());
    }

    #[tokio::test]
    async fn server_error_uses_emergency_lines() {
        let base = serve_once("HTTP/1.1 500 Internal Server Error", "{}").await;
        let source = BackendDialogue::new("Sally", &base, emergency()).expect("client");

        assert_eq!(source.fetch_dialogue().await, emergency());
    }

    #[tokio::test]
    async fn unreachable_backend_uses_emergency_lines() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let address = listener.local_addr().expect("addr");
        drop(listener);
        let source =
            BackendDialogue::new("Sally", &format!("http://{address}/api/sally"), emergency())
                .expect("client");

        assert_eq!(source.fetch_dialogue().await, emergency());
    }
}
