use serde::{Deserialize, Serialize};

/// One entry in the sidebar's conversation list, as returned by
/// `GET /api/chats`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ChatSummary {
    pub id: String,
    pub title: String,
    pub message_count: u32,
}

/// Wrapper for the `GET /api/chats` response body.
#[derive(Clone, Debug, Deserialize)]
pub struct ChatList {
    pub chats: Vec<ChatSummary>,
}

/// Author of one message turn.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Display label shown above each message bubble.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Assistant",
        }
    }

    /// CSS modifier class for a message bubble.
    pub fn css_class(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A scored retrieval excerpt the server attaches to assistant answers.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RagSource {
    pub score: f64,
    pub text: String,
}

/// One turn in a conversation.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub rag_sources: Option<Vec<RagSource>>,
}

/// Wrapper for the `GET /api/chats/{id}` response body. A missing
/// `messages` field decodes as an empty history.
#[derive(Clone, Debug, Deserialize)]
pub struct ChatHistory {
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Request body for the streaming `POST /api/chat` endpoint. The contract
/// expects an explicit `"chat_id": null` when starting a new conversation,
/// so the field is always serialized.
#[derive(Clone, Debug, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub chat_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn chat_list_deserializes() {
        let json = r#"{"chats":[{"id":"c1","title":"Wine farms","message_count":4}]}"#;
        let list: ChatList = serde_json::from_str(json).unwrap();
        assert_eq!(
            list.chats,
            vec![ChatSummary {
                id: "c1".to_string(),
                title: "Wine farms".to_string(),
                message_count: 4,
            }]
        );
    }

    #[test]
    fn message_without_sources_or_timestamp() {
        let json = r#"{"role":"assistant","content":"Hello"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "Hello");
        assert_eq!(msg.timestamp, "");
        assert_eq!(msg.rag_sources, None);
    }

    #[test]
    fn history_tolerates_missing_messages_field() {
        let history: ChatHistory = serde_json::from_str("{}").unwrap();
        assert!(history.messages.is_empty());
    }

    #[test]
    fn chat_request_serializes_null_chat_id() {
        let req = ChatRequest {
            message: "hi".to_string(),
            chat_id: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"message":"hi","chat_id":null}"#);
    }
}
