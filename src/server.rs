//! Local stand-in for the assistant endpoint.
//!
//! Speaks the same chat contract as the real backend so the client can be
//! exercised without one. It keeps no conversation state: it hands out
//! session ids, answers greetings, and otherwise reports that the book is
//! unavailable.

use crate::protocol::{ChatRequest, ChatResponse, ErrorBody, UNAVAILABLE_SENTINEL};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::error::Error;
use tokio::net::TcpListener;
use uuid::Uuid;

pub const CHAT_PATH: &str = "/api/v1/chat/";

const MAX_QUESTION_CHARS: usize = 10_000;

const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "greetings",
    "good morning",
    "good afternoon",
    "good evening",
    "what's up",
    "whats up",
    "howdy",
    "hi there",
    "hello there",
    "hey there",
    "good day",
    "how are you",
    "how do you do",
    "yo",
    "sup",
    "what's good",
    "what's happening",
    "what's new",
    "hiya",
    "hola",
    "bonjour",
    "ciao",
    "gday",
    "morning",
    "afternoon",
    "evening",
    "salutations",
    "ahoy",
    "how are you doing",
    "how's it going",
    "how goes it",
];

const GREETING_REPLY: &str = "Hello! Welcome to the Digital Book Assistant! I'm here to help you explore and understand the content of your Physical AI and Robotics book. \
Feel free to ask me anything about the book's content, chapters, or specific topics. Here are some examples of what you can ask:\n\n\
• \"What is Physical AI?\"\n\
• \"How many chapters are there in this book?\"\n\
• \"Summarize chapter 5\"\n\
• \"Explain robot locomotion\"\n\
• \"What does the book say about human-robot interaction?\"\n\n\
Just type your question and I'll do my best to find the relevant information from the book for you!";

pub struct ServerConfig {
    pub listen: String,
}

type ServerResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

type ChatRejection = (StatusCode, Json<ErrorBody>);

pub async fn run(config: ServerConfig) -> ServerResult<()> {
    let listener = TcpListener::bind(&config.listen).await?;
    println!(
        "tutor stand-in listening on http://{}{}",
        listener.local_addr()?,
        CHAT_PATH
    );
    serve(listener).await
}

pub async fn serve(listener: TcpListener) -> ServerResult<()> {
    tracing::info!(addr = %listener.local_addr()?, "assistant stand-in started");
    axum::serve(listener, router()).await?;
    Ok(())
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route(CHAT_PATH, post(chat))
        .route(CHAT_PATH.trim_end_matches('/'), post(chat))
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Book tutor assistant stand-in is running!" }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "api": "rag-chatbot" }))
}

async fn chat(Json(payload): Json<ChatRequest>) -> Result<Json<ChatResponse>, ChatRejection> {
    if let Err(reason) = validate_question(&payload.message) {
        tracing::info!(%reason, "rejecting chat request");
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorBody {
                detail: Some(format!("Invalid question: {reason}")),
            }),
        ));
    }

    let session_id = resolve_session(payload.session_id.as_deref());
    let response = match greeting_reply(&payload.message) {
        Some(reply) => reply.to_string(),
        None => UNAVAILABLE_SENTINEL.to_string(),
    };

    tracing::info!(%session_id, chars = payload.message.chars().count(), "answered chat request");
    Ok(Json(ChatResponse {
        response,
        session_id: Some(session_id),
    }))
}

fn validate_question(question: &str) -> Result<(), &'static str> {
    if question.trim().is_empty() {
        return Err("Question text cannot be empty");
    }
    if question.chars().count() > MAX_QUESTION_CHARS {
        return Err("Question text is too long (max 10,000 characters)");
    }
    Ok(())
}

/// Keeps a well-formed UUID, replaces anything else with a fresh one.
fn resolve_session(requested: Option<&str>) -> String {
    match requested.map(Uuid::try_parse) {
        Some(Ok(id)) => id.to_string(),
        _ => Uuid::new_v4().to_string(),
    }
}

fn greeting_reply(message: &str) -> Option<&'static str> {
    let normalized = message.trim().to_lowercase();
    GREETINGS
        .contains(&normalized.as_str())
        .then_some(GREETING_REPLY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{AssistantClient, ClientConfig, ClientError};
    use crate::protocol::ChatOutcome;

    async fn spawn_server() -> AssistantClient {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener));
        AssistantClient::new(ClientConfig {
            endpoint: format!("http://{addr}{CHAT_PATH}"),
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

    #[test]
    fn greetings_match_whole_message_only() {
        assert!(greeting_reply("  Hello ").is_some());
        assert!(greeting_reply("Good Morning").is_some());
        assert!(greeting_reply("hello, what is physical ai?").is_none());
        assert!(greeting_reply("thanks").is_none());
    }

    #[test]
    fn session_ids_are_kept_only_when_valid() {
        let id = "6f1c8a52-3d1e-4f5b-9a77-0c2b9d3e4a10";
        assert_eq!(resolve_session(Some(id)), id);

        let minted = resolve_session(Some("abc"));
        assert_ne!(minted, "abc");
        assert!(Uuid::try_parse(&minted).is_ok());

        assert!(Uuid::try_parse(&resolve_session(None)).is_ok());
    }

    #[test]
    fn validation_rejects_blank_and_oversized() {
        assert!(validate_question("   ").is_err());
        assert!(validate_question(&"a".repeat(MAX_QUESTION_CHARS + 1)).is_err());
        assert!(validate_question(&"a".repeat(MAX_QUESTION_CHARS)).is_ok());
    }

    #[tokio::test]
    async fn first_contact_mints_session_and_it_is_echoed() {
        let client = spawn_server().await;

        let ChatOutcome::Success {
            response,
            session_id,
        } = client.send(&request("hello", None)).await
        else {
            panic!("expected success");
        };
        assert!(response.starts_with("Hello! Welcome"));
        let session_id = session_id.unwrap();

        let second = client
            .try_send(&request("What is Physical AI?", Some(&session_id)))
            .await
            .unwrap();
        assert_eq!(second.response, UNAVAILABLE_SENTINEL);
        assert_eq!(second.session_id.as_deref(), Some(session_id.as_str()));
    }

    #[tokio::test]
    async fn blank_message_is_rejected_with_detail() {
        let client = spawn_server().await;
        let err = client.try_send(&request("  ", None)).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Status { status, .. } if status.as_u16() == 422
        ));
        assert_eq!(
            err.detail(),
            Some("Invalid question: Question text cannot be empty")
        );
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener));

        let body: Value = reqwest::get(format!("http://{addr}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "healthy");
    }
}
