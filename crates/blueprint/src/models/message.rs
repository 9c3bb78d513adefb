use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;

/// One entry in a chat: plain user or assistant text, or a serialized
/// agent result envelope.
///
/// Id and role never change after creation; assistant content is either the
/// send-time placeholder, an envelope, or a session notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user<S: Into<String>>(content: S) -> Self {
        Message {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Message {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_get_distinct_ids() {
        let a = Message::user("hi");
        let b = Message::user("hi");
        assert_ne!(a.id, b.id);
        assert_eq!(a.role, Role::User);
    }

    #[test]
    fn test_message_round_trip() {
        let message = Message::assistant("done");
        let serialized = serde_json::to_string(&message).unwrap();
        let deserialized: Message = serde_json::from_str(&serialized).unwrap();
        assert_eq!(message, deserialized);
    }
}
