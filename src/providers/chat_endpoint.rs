//! Chat-mode completion endpoint client
//!
//! Talks to text-generation servers that accept a chat request body of the
//! form:
//!
//! ```json
//! {"mode": "chat", "character": "Example", "messages": [{"role": "...", "content": "..."}]}
//! ```
//!
//! and answer with an OpenAI-style `{"choices": [{"message": {"content": "..."}}]}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::CompletionSettings;
use crate::conversation::Turn;

use super::{CompletionClient, CompletionError};

/// Wire format of one message
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

impl<'a> From<&'a Turn> for ChatMessage<'a> {
    fn from(turn: &'a Turn) -> Self {
        Self {
            role: turn.role.as_str(),
            content: &turn.content,
        }
    }
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    mode: &'static str,
    character: &'static str,
    messages: Vec<ChatMessage<'a>>,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// HTTP client for the completion endpoint
pub struct ChatEndpointClient {
    client: Client,
}

impl ChatEndpointClient {
    pub fn new(timeout: Duration, accept_invalid_certs: bool) -> Result<Self, CompletionError> {
        if accept_invalid_certs {
            tracing::warn!("⚠️ TLS certificate verification is disabled for the completion endpoint");
        }

        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| CompletionError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    pub fn from_settings(settings: &CompletionSettings) -> Result<Self, CompletionError> {
        Self::new(
            Duration::from_secs(settings.timeout_secs),
            settings.accept_invalid_certs,
        )
    }
}

#[async_trait]
impl CompletionClient for ChatEndpointClient {
    async fn complete(&self, endpoint: &str, messages: &[Turn]) -> Result<String, CompletionError> {
        let request = ChatCompletionRequest {
            mode: "chat",
            character: "Example",
            messages: messages.iter().map(ChatMessage::from).collect(),
        };

        let response = self
            .client
            .post(endpoint)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(CompletionError::Http {
                status: status.as_u16(),
                body,
            });
        }

        parse_reply(&body)
    }
}

fn transport_error(e: reqwest::Error) -> CompletionError {
    if e.is_timeout() {
        CompletionError::Timeout
    } else {
        CompletionError::Transport(e.to_string())
    }
}

/// First choice's message content
fn parse_reply(body: &str) -> Result<String, CompletionError> {
    let completion: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::MalformedResponse(format!("Failed to parse response: {}", e)))?;

    completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| CompletionError::MalformedResponse("No choices in response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Serve one canned response; the handle yields the raw request
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/v1/chat/completions", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
            request
        });

        (url, handle)
    }

    fn client() -> ChatEndpointClient {
        ChatEndpointClient::new(Duration::from_secs(5), false).unwrap()
    }

    fn messages() -> Vec<Turn> {
        vec![
            Turn::system("You are a helpful assistant named Alfred AI. "),
            Turn::user("Hello"),
        ]
    }

    #[test]
    fn test_parse_reply() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hi there"}}]}"#;
        assert_eq!(parse_reply(body).unwrap(), "Hi there");
    }

    #[test]
    fn test_parse_reply_missing_fields() {
        for body in [
            r#"{"choices":[]}"#,
            r#"{"choices":[{"message":{}}]}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
            r#"{"result":"Hi"}"#,
            "<html>bad gateway</html>",
            "",
        ] {
            assert!(
                matches!(parse_reply(body), Err(CompletionError::MalformedResponse(_))),
                "{}",
                body
            );
        }
    }

    #[tokio::test]
    async fn test_success_sends_chat_body() {
        let (url, server) =
            serve_once("200 OK", r#"{"choices":[{"message":{"content":"Hi there"}}]}"#).await;

        let reply = client().complete(&url, &messages()).await.unwrap();
        assert_eq!(reply, "Hi there");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1/chat/completions"));
        let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["mode"], "chat");
        assert_eq!(json["character"], "Example");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Hello");
    }

    #[tokio::test]
    async fn test_non_success_status_is_http_error() {
        let (url, _server) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;

        let err = client().complete(&url, &messages()).await.unwrap_err();
        match err {
            CompletionError::Http { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("boom"));
            }
            other => panic!("expected http error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_success_without_choices_is_malformed() {
        let (url, _server) = serve_once("200 OK", r#"{"choices":[]}"#).await;

        let err = client().complete(&url, &messages()).await.unwrap_err();
        assert_eq!(err.kind(), "malformed_response");
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/v1/chat/completions", listener.local_addr().unwrap());
        let _server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_request(&mut stream).await;
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let client = ChatEndpointClient::new(Duration::from_millis(200), false).unwrap();
        let err = client.complete(&url, &messages()).await.unwrap_err();
        assert!(matches!(err, CompletionError::Timeout), "{:?}", err);
    }

    #[tokio::test]
    async fn test_refused_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{}/v1/chat/completions", addr);
        let err = client().complete(&url, &messages()).await.unwrap_err();
        assert!(matches!(err, CompletionError::Transport(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_invalid_url_is_transport_error() {
        let err = client().complete("not a url", &messages()).await.unwrap_err();
        assert!(matches!(err, CompletionError::Transport(_)), "{:?}", err);
    }
}
