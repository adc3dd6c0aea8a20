use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Result as SqlResult, Row, params};
use std::path::Path;

use super::database::Database;
use crate::common::{Chat, ChatMessage, Friend, chat_id_for};

/// SQLite store behind the local data service (users, friendships, chats, messages).
pub struct ChatDatabase {
    db: Database,
}

impl ChatDatabase {
    /// Initialize the database at custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> SqlResult<Self> {
        Self::from_database(Database::new(path)?)
    }

    pub fn in_memory() -> SqlResult<Self> {
        Self::from_database(Database::in_memory()?)
    }

    fn from_database(db: Database) -> SqlResult<Self> {
        let chat_db = Self { db };
        chat_db.init_schema()?;
        Ok(chat_db)
    }

    fn init_schema(&self) -> SqlResult<()> {
        let conn = self.db.connection();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                username TEXT NOT NULL UNIQUE,
                avatar TEXT NOT NULL DEFAULT '',
                bio TEXT,
                email TEXT
            )",
            [],
        )?;

        // Each friendship is stored in both directions
        conn.execute(
            "CREATE TABLE IF NOT EXISTS friendships (
                user_id TEXT NOT NULL REFERENCES users(id),
                friend_id TEXT NOT NULL REFERENCES users(id),
                PRIMARY KEY (user_id, friend_id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS chats (
                id TEXT PRIMARY KEY,
                user_a TEXT NOT NULL REFERENCES users(id),
                user_b TEXT NOT NULL REFERENCES users(id),
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                chat_id TEXT NOT NULL REFERENCES chats(id),
                sender_id TEXT NOT NULL REFERENCES users(id),
                content TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                read INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_messages_chat_timestamp ON messages(chat_id, timestamp)",
            [],
        )?;

        Ok(())
    }

    // ========== Users ==========

    /// Insert or replace a user profile. The `friends` field is ignored.
    pub fn upsert_user(&self, user: &Friend) -> SqlResult<()> {
        let conn = self.db.connection();
        conn.execute(
            "INSERT OR REPLACE INTO users (id, name, username, avatar, bio, email)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id,
                user.name,
                user.username,
                user.avatar,
                user.bio,
                user.email
            ],
        )?;
        Ok(())
    }

    pub fn user_exists(&self, user_id: &str) -> SqlResult<bool> {
        let conn = self.db.connection();
        let found = conn
            .query_row(
                "SELECT 1 FROM users WHERE id = ?1",
                params![user_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Get a profile with its friend ids filled in
    pub fn get_user(&self, user_id: &str) -> SqlResult<Option<Friend>> {
        let conn = self.db.connection();
        let user = conn
            .query_row(
                "SELECT id, name, username, avatar, bio, email FROM users WHERE id = ?1",
                params![user_id],
                profile_from_row,
            )
            .optional()?;

        match user {
            Some(mut user) => {
                user.friends = Some(self.friend_ids(&user.id)?);
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    // ========== Friendships ==========

    /// Connect two users; repeated calls are harmless
    pub fn befriend(&mut self, a: &str, b: &str) -> SqlResult<()> {
        let tx = self.db.connection_mut().transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO friendships (user_id, friend_id) VALUES (?1, ?2)",
            params![a, b],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO friendships (user_id, friend_id) VALUES (?1, ?2)",
            params![b, a],
        )?;
        tx.commit()
    }

    pub fn friend_ids(&self, user_id: &str) -> SqlResult<Vec<String>> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(
            "SELECT friend_id FROM friendships WHERE user_id = ?1 ORDER BY friend_id",
        )?;
        let ids = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<SqlResult<Vec<String>>>()?;
        Ok(ids)
    }

    /// Friends of a user ordered by display name
    pub fn friends_of(&self, user_id: &str) -> SqlResult<Vec<Friend>> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(
            "SELECT u.id, u.name, u.username, u.avatar, u.bio, u.email
             FROM friendships f
             JOIN users u ON u.id = f.friend_id
             WHERE f.user_id = ?1
             ORDER BY u.name COLLATE NOCASE",
        )?;
        let mut friends = stmt
            .query_map(params![user_id], profile_from_row)?
            .collect::<SqlResult<Vec<_>>>()?;

        for friend in &mut friends {
            friend.friends = Some(self.friend_ids(&friend.id)?);
        }
        Ok(friends)
    }

    // ========== Chats ==========

    /// Create the chat between two users if it does not exist yet and return its id.
    ///
    /// Returns `None` when the id is already taken by a chat of another pair.
    pub fn ensure_chat(
        &self,
        a: &str,
        b: &str,
        created_at: DateTime<Utc>,
    ) -> SqlResult<Option<String>> {
        let chat_id = chat_id_for(a, b);
        let (user_a, user_b) = if a <= b { (a, b) } else { (b, a) };
        {
            let conn = self.db.connection();
            conn.execute(
                "INSERT OR IGNORE INTO chats (id, user_a, user_b, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![chat_id, user_a, user_b, created_at.timestamp_millis()],
            )?;
        }

        match self.chat_participants(&chat_id)? {
            Some((stored_a, stored_b)) if stored_a == user_a && stored_b == user_b => {
                Ok(Some(chat_id))
            }
            Some((stored_a, stored_b)) => {
                log::warn!(
                    "Chat {chat_id} belongs to {stored_a} and {stored_b}, not {user_a} and {user_b}"
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub fn chat_participants(&self, chat_id: &str) -> SqlResult<Option<(String, String)>> {
        let conn = self.db.connection();
        conn.query_row(
            "SELECT user_a, user_b FROM chats WHERE id = ?1",
            params![chat_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
    }

    /// Chats of a user, most recent activity first
    pub fn chats_for(&self, user_id: &str) -> SqlResult<Vec<Chat>> {
        let rows = {
            let conn = self.db.connection();
            let mut stmt = conn.prepare(
                "SELECT c.id,
                        CASE WHEN c.user_a = ?1 THEN c.user_b ELSE c.user_a END,
                        (SELECT m.content FROM messages m WHERE m.chat_id = c.id
                         ORDER BY m.timestamp DESC, m.rowid DESC LIMIT 1),
                        (SELECT MAX(m.timestamp) FROM messages m WHERE m.chat_id = c.id),
                        (SELECT COUNT(*) FROM messages m WHERE m.chat_id = c.id
                         AND m.sender_id != ?1 AND m.read = 0),
                        c.created_at
                 FROM chats c
                 WHERE c.user_a = ?1 OR c.user_b = ?1",
            )?;
            stmt.query_map(params![user_id], |row| {
                Ok(ChatRow {
                    id: row.get(0)?,
                    other_id: row.get(1)?,
                    last_message: row.get(2)?,
                    last_message_at: row.get(3)?,
                    unread_count: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<SqlResult<Vec<_>>>()?
        };

        let mut chats = Vec::with_capacity(rows.len());
        let mut order = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(other_user) = self.get_user(&row.other_id)? else {
                log::warn!("Chat {} references unknown user {}", row.id, row.other_id);
                continue;
            };
            order.push(row.last_message_at.unwrap_or(row.created_at));
            chats.push(Chat {
                id: row.id,
                other_user,
                last_message: row.last_message,
                last_message_at: row.last_message_at.map(from_millis),
                unread_count: u32::try_from(row.unread_count).unwrap_or(u32::MAX),
            });
        }

        let mut indexed: Vec<_> = order.into_iter().zip(chats).collect();
        indexed.sort_by(|(left, _), (right, _)| right.cmp(left));
        Ok(indexed.into_iter().map(|(_, chat)| chat).collect())
    }

    // ========== Messages ==========

    pub fn insert_message(&self, message: &ChatMessage) -> SqlResult<()> {
        let conn = self.db.connection();
        conn.execute(
            "INSERT OR IGNORE INTO messages (id, chat_id, sender_id, content, timestamp, read)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                message.id,
                message.chat_id,
                message.sender_id,
                message.content,
                message.timestamp.timestamp_millis(),
                message.read
            ],
        )?;
        Ok(())
    }

    /// Messages of a chat in chronological order
    pub fn messages_in(&self, chat_id: &str) -> SqlResult<Vec<ChatMessage>> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(
            "SELECT id, chat_id, sender_id, content, timestamp, read
             FROM messages
             WHERE chat_id = ?1
             ORDER BY timestamp ASC, rowid ASC",
        )?;
        let messages = stmt
            .query_map(params![chat_id], |row| {
                Ok(ChatMessage {
                    id: row.get(0)?,
                    chat_id: row.get(1)?,
                    sender_id: row.get(2)?,
                    content: row.get(3)?,
                    timestamp: from_millis(row.get(4)?),
                    read: row.get(5)?,
                })
            })?
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(messages)
    }

    /// Mark everything the other participant sent as read; returns the number of rows touched
    pub fn mark_read(&self, chat_id: &str, reader_id: &str) -> SqlResult<usize> {
        let conn = self.db.connection();
        conn.execute(
            "UPDATE messages SET read = 1 WHERE chat_id = ?1 AND sender_id != ?2 AND read = 0",
            params![chat_id, reader_id],
        )
    }
}

struct ChatRow {
    id: String,
    other_id: String,
    last_message: Option<String>,
    last_message_at: Option<i64>,
    unread_count: i64,
    created_at: i64,
}

fn profile_from_row(row: &Row<'_>) -> SqlResult<Friend> {
    Ok(Friend {
        id: row.get(0)?,
        name: row.get(1)?,
        username: row.get(2)?,
        avatar: row.get(3)?,
        bio: row.get(4)?,
        email: row.get(5)?,
        friends: None,
    })
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}
