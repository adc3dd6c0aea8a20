pub mod commands;
pub mod events;
pub mod types;

pub use commands::{HomeIntent, HomeView};
pub use events::FeedEvent;
pub use types::{Chat, ChatMessage, Friend, User, chat_id_for};
