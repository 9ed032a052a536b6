use crate::protocol::{ChatOutcome, ChatRequest, ChatResponse, ErrorBody};
use reqwest::Client as HttpClient;
use reqwest::StatusCode;
use std::time::Duration;

pub struct ClientConfig {
    pub endpoint: String,
    pub timeout: Option<Duration>,
}

/// Errors raised while talking to the assistant endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("assistant returned {status}")]
    Status {
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("could not decode assistant reply: {0}")]
    Decode(#[source] reqwest::Error),
}

impl ClientError {
    /// Server-supplied detail, if the failure carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::Status { detail, .. } => detail.as_deref(),
            ClientError::Transport(_) | ClientError::Decode(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct AssistantClient {
    endpoint: String,
    http: HttpClient,
}

impl AssistantClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut builder = HttpClient::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ClientError::Transport)?;

        Ok(Self {
            endpoint: config.endpoint,
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn try_send(&self, request: &ChatRequest) -> Result<ChatResponse, ClientError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            has_session = request.session_id.is_some(),
            "sending chat request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            // A body that is not the expected error shape still counts as a failure.
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.detail);
            return Err(ClientError::Status { status, detail });
        }

        response.json().await.map_err(ClientError::Decode)
    }

    /// Performs one round trip and folds every failure into [`ChatOutcome::Failure`].
    pub async fn send(&self, request: &ChatRequest) -> ChatOutcome {
        match self.try_send(request).await {
            Ok(body) => {
                tracing::debug!(has_session = body.session_id.is_some(), "chat reply received");
                ChatOutcome::from(body)
            }
            Err(err) => {
                tracing::warn!(error = %err, "chat request failed");
                ChatOutcome::Failure {
                    detail: err.detail().map(str::to_string),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AssistantClient {
        AssistantClient::new(ClientConfig {
            endpoint: format!("{}/api/v1/chat/", server.uri()),
            timeout: None,
        })
        .unwrap()
    }

    fn request(message: &str, session_id: Option<&str>) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            session_id: session_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn first_request_body_has_no_session_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/"))
            .and(body_json(json!({ "message": "What is Physical AI?" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "response": "It's...", "session_id": "abc" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client_for(&server)
            .send(&request("What is Physical AI?", None))
            .await;

        assert_eq!(
            outcome,
            ChatOutcome::Success {
                response: "It's...".to_string(),
                session_id: Some("abc".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn session_id_is_sent_when_held() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/"))
            .and(body_json(json!({ "message": "And chapter 2?", "session_id": "abc" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "ok" })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client_for(&server)
            .send(&request("And chapter 2?", Some("abc")))
            .await;

        assert!(matches!(outcome, ChatOutcome::Success { session_id: None, .. }));
    }

    #[tokio::test]
    async fn error_detail_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({ "detail": "Rate limited" })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .try_send(&request("hello there", None))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Status { status, .. } if status == StatusCode::TOO_MANY_REQUESTS));
        assert_eq!(err.detail(), Some("Rate limited"));
    }

    #[tokio::test]
    async fn error_without_detail_has_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({})))
            .mount(&server)
            .await;

        let outcome = client_for(&server).send(&request("hello there", None)).await;
        assert_eq!(outcome, ChatOutcome::Failure { detail: None });
    }

    #[tokio::test]
    async fn non_json_error_body_has_no_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let outcome = client_for(&server).send(&request("hello there", None)).await;
        assert_eq!(outcome, ChatOutcome::Failure { detail: None });
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "wrong field" })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .try_send(&request("hello there", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_failure() {
        let client = AssistantClient::new(ClientConfig {
            endpoint: "http://127.0.0.1:9/api/v1/chat/".to_string(),
            timeout: Some(Duration::from_secs(2)),
        })
        .unwrap();

        let err = client.try_send(&request("hello there", None)).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(err.detail(), None);
    }
}
