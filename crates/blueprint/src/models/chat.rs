use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::message::Message;

/// Display titles are cut from the first user input.
pub const MAX_TITLE_LEN: usize = 30;

/// A conversation: an ordered, append-only message log plus display
/// metadata. Insertion order is conversation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    pub title: String,
    #[serde(default = "Utc::now", deserialize_with = "lenient_created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Chat {
    pub fn new<S: Into<String>>(title: S) -> Self {
        Chat {
            id: Uuid::new_v4(),
            title: title.into(),
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }

    /// Title derived from the first user input, truncated.
    pub fn derive_title(input: &str) -> String {
        let title: String = input.chars().take(MAX_TITLE_LEN).collect();
        if title.is_empty() {
            "New Chat".to_string()
        } else {
            title
        }
    }
}

// Persisted chats may predate the timestamp field; anything absent or
// unreadable loads as "now".
fn lenient_created_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|_| Utc::now()))
}
