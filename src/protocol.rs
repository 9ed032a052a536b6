use serde::{Deserialize, Serialize};

/// Reply the backend sends when it has no model configured.
pub const UNAVAILABLE_SENTINEL: &str = "The book is currently unavailable.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Result of one round trip, decoded at the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    Success {
        response: String,
        session_id: Option<String>,
    },
    Failure {
        detail: Option<String>,
    },
}

impl From<ChatResponse> for ChatOutcome {
    fn from(body: ChatResponse) -> Self {
        ChatOutcome::Success {
            response: body.response,
            session_id: body.session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_missing_session_id() {
        let request = ChatRequest {
            message: "What is Physical AI?".to_string(),
            session_id: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "What is Physical AI?" }));
    }

    #[test]
    fn response_tolerates_missing_session_id() {
        let body: ChatResponse = serde_json::from_str(r#"{"response":"hi"}"#).unwrap();
        assert_eq!(body.session_id, None);
        assert_eq!(
            ChatOutcome::from(body),
            ChatOutcome::Success {
                response: "hi".to_string(),
                session_id: None,
            }
        );
    }

    #[test]
    fn error_body_without_detail_decodes() {
        let body: ErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body.detail, None);

        let body: ErrorBody = serde_json::from_str(r#"{"detail":"Rate limited"}"#).unwrap();
        assert_eq!(body.detail.as_deref(), Some("Rate limited"));
    }
}
