//! Data service the UI talks to.
//!
//! The home screen never touches storage or the network directly. It calls the
//! operations of [`DataService`] and consumes live feeds through channels. Two
//! backends exist: [`LocalDataService`] over SQLite and [`RemoteDataService`]
//! over a JSON HTTP API.

pub mod local;
pub mod remote;
pub mod subscription;

pub use local::LocalDataService;
pub use remote::RemoteDataService;
pub use subscription::Subscription;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::common::{Chat, ChatMessage, FeedEvent, Friend};

/// Sending half of a live feed.
pub type FeedSink<T> = mpsc::Sender<FeedEvent<T>>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unknown user `{0}`")]
    UnknownUser(String),

    #[error("unknown chat `{0}`")]
    UnknownChat(String),

    #[error("chat `{0}` belongs to another pair of users")]
    ChatConflict(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("message text is empty")]
    EmptyMessage,

    #[error("background task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

#[async_trait]
pub trait DataService: Send + Sync {
    /// One-shot fetch of the user's friends.
    async fn get_friends(&self, user_id: &str) -> Result<Vec<Friend>, ServiceError>;

    /// Stream snapshots of the user's chats into `sink` until the subscription is released.
    ///
    /// Must be called from within a tokio runtime.
    fn subscribe_to_chats(&self, user_id: &str, sink: FeedSink<Vec<Chat>>) -> Subscription;

    /// Create the chat between two users if needed and return its id.
    async fn open_chat(&self, user_id: &str, friend_id: &str) -> Result<String, ServiceError>;

    /// Stream snapshots of one chat's messages into `sink`.
    fn subscribe_to_messages(
        &self,
        chat_id: &str,
        sink: FeedSink<Vec<ChatMessage>>,
    ) -> Subscription;

    async fn send_message(
        &self,
        chat_id: &str,
        sender_id: &str,
        content: &str,
    ) -> Result<ChatMessage, ServiceError>;

    /// Mark everything the other participant sent in `chat_id` as read by `user_id`.
    async fn mark_read(&self, chat_id: &str, user_id: &str) -> Result<(), ServiceError>;
}
