use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The signed-in account the home screen is built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            id: id.into(),
            display_name,
        }
    }

    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

/// Profile of another account connected to the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    pub id: String,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Ids of this friend's own friends, when the backend shares them.
    #[serde(default)]
    pub friends: Option<Vec<String>>,
}

impl Friend {
    pub fn friend_count(&self) -> usize {
        self.friends.as_ref().map_or(0, Vec::len)
    }
}

/// Summary of the latest activity in a conversation with one other participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub other_user: Friend,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unread_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

/// Chat ids are derived from the participant pair so both sides agree on them.
///
/// `_` separates the two ids, so `%` and `_` inside an id are escaped and no
/// two pairs share an id.
pub fn chat_id_for(a: &str, b: &str) -> String {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    format!("{}_{}", escape_id(first), escape_id(second))
}

fn escape_id(id: &str) -> Cow<'_, str> {
    if id.contains(['%', '_']) {
        Cow::Owned(id.replace('%', "%25").replace('_', "%5F"))
    } else {
        Cow::Borrowed(id)
    }
}
