use chrono::{Duration, Utc};
use rusqlite::Result as SqlResult;
use uuid::Uuid;

use super::ChatDatabase;
use crate::common::{ChatMessage, Friend};

struct DemoUser {
    id: &'static str,
    name: &'static str,
    bio: Option<&'static str>,
}

const DEMO_USERS: &[DemoUser] = &[
    DemoUser { id: "alice", name: "Alice Martin", bio: Some("Coffee, code, repeat.") },
    DemoUser { id: "bob", name: "Bob Chen", bio: Some("Weekend cyclist") },
    DemoUser { id: "carol", name: "Carol Diaz", bio: None },
    DemoUser { id: "dave", name: "Dave Okafor", bio: Some("Ask me about sourdough") },
    DemoUser { id: "erin", name: "Erin Walsh", bio: None },
];

const DEMO_FRIENDSHIPS: &[(&str, &str)] = &[
    ("alice", "bob"),
    ("alice", "carol"),
    ("alice", "dave"),
    ("bob", "carol"),
    ("dave", "erin"),
];

const DEMO_THREAD: &[(&str, &str)] = &[
    ("bob", "Are we still on for Saturday?"),
    ("alice", "Yes! 9am at the trailhead."),
    ("bob", "Perfect, bringing snacks."),
];

/// Fill the store with a small demo network. Running it twice is harmless.
pub fn seed_demo_data(db: &mut ChatDatabase) -> SqlResult<()> {
    for user in DEMO_USERS {
        db.upsert_user(&Friend {
            id: user.id.to_string(),
            name: user.name.to_string(),
            username: user.id.to_string(),
            avatar: format!("avatars/{}.png", user.id),
            bio: user.bio.map(str::to_string),
            email: Some(format!("{}@example.com", user.id)),
            friends: None,
        })?;
    }

    for (a, b) in DEMO_FRIENDSHIPS {
        db.befriend(a, b)?;
    }

    let start = Utc::now() - Duration::hours(3);
    if let Some(thread) = db.ensure_chat("alice", "bob", start)? {
        if db.messages_in(&thread)?.is_empty() {
            for (offset, (sender, content)) in DEMO_THREAD.iter().enumerate() {
                db.insert_message(&ChatMessage {
                    id: Uuid::new_v4().to_string(),
                    chat_id: thread.clone(),
                    sender_id: sender.to_string(),
                    content: content.to_string(),
                    timestamp: start + Duration::minutes(offset as i64 * 7),
                    read: false,
                })?;
            }
        }
    }
    db.ensure_chat("alice", "carol", start)?;

    log::info!(
        "Seeded {} users and {} friendships",
        DEMO_USERS.len(),
        DEMO_FRIENDSHIPS.len()
    );
    Ok(())
}
