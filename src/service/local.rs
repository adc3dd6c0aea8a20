use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use super::{DataService, FeedSink, ServiceError, Subscription};
use crate::common::{Chat, ChatMessage, FeedEvent, Friend, chat_id_for};
use crate::storage::ChatDatabase;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// A write that may change what some feed shows.
#[derive(Debug, Clone)]
struct ChatChange {
    chat_id: String,
    participants: (String, String),
}

impl ChatChange {
    fn involves(&self, user_id: &str) -> bool {
        self.participants.0 == user_id || self.participants.1 == user_id
    }
}

/// Data service backed by the local SQLite store.
///
/// Writes made through this service are broadcast to the live feeds, which
/// re-query and push a fresh snapshot.
pub struct LocalDataService {
    db: Arc<Mutex<ChatDatabase>>,
    changes: broadcast::Sender<ChatChange>,
}

impl LocalDataService {
    pub fn new(db: ChatDatabase) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            db: Arc::new(Mutex::new(db)),
            changes,
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ServiceError> {
        Ok(Self::new(ChatDatabase::with_path(path)?))
    }

    async fn with_db<T, F>(&self, f: F) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce(&ChatDatabase) -> Result<T, ServiceError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let guard = lock(&db)?;
            f(&*guard)
        })
        .await?
    }

    fn notify(&self, change: ChatChange) {
        // No receivers just means nobody is subscribed right now.
        let _ = self.changes.send(change);
    }

    fn spawn_feed<T, Q, R>(&self, sink: FeedSink<T>, query: Q, relevant: R) -> Subscription
    where
        T: Send + 'static,
        Q: Fn(&ChatDatabase) -> Result<T, ServiceError> + Send + Sync + 'static,
        R: Fn(&ChatChange) -> bool + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        // Subscribe before the first query so no write slips between them.
        let mut changes = self.changes.subscribe();
        let query = Arc::new(query);

        Subscription::new(tokio::spawn(async move {
            loop {
                let event = match run_query(&db, &query).await {
                    Ok(snapshot) => FeedEvent::Snapshot(snapshot),
                    Err(err) => {
                        log::warn!("Local feed query failed: {err}");
                        FeedEvent::Failed(err.to_string())
                    }
                };
                if sink.send(event).await.is_err() {
                    log::debug!("Feed receiver dropped; stopping local feed");
                    return;
                }

                loop {
                    match changes.recv().await {
                        Ok(change) if relevant(&change) => break,
                        Ok(_) => continue,
                        Err(RecvError::Lagged(skipped)) => {
                            log::debug!("Local feed lagged by {skipped} changes; re-querying");
                            break;
                        }
                        Err(RecvError::Closed) => return,
                    }
                }
            }
        }))
    }
}

#[async_trait]
impl DataService for LocalDataService {
    async fn get_friends(&self, user_id: &str) -> Result<Vec<Friend>, ServiceError> {
        let user_id = user_id.to_string();
        self.with_db(move |db| {
            if !db.user_exists(&user_id)? {
                return Err(ServiceError::UnknownUser(user_id));
            }
            Ok(db.friends_of(&user_id)?)
        })
        .await
    }

    fn subscribe_to_chats(&self, user_id: &str, sink: FeedSink<Vec<Chat>>) -> Subscription {
        let query_user = user_id.to_string();
        let watch_user = user_id.to_string();
        self.spawn_feed(
            sink,
            move |db| Ok(db.chats_for(&query_user)?),
            move |change| change.involves(&watch_user),
        )
    }

    async fn open_chat(&self, user_id: &str, friend_id: &str) -> Result<String, ServiceError> {
        let user_id = user_id.to_string();
        let friend_id = friend_id.to_string();
        let (chat_id, participants) = self
            .with_db(move |db| {
                for id in [&user_id, &friend_id] {
                    if !db.user_exists(id)? {
                        return Err(ServiceError::UnknownUser(id.clone()));
                    }
                }
                let chat_id = db
                    .ensure_chat(&user_id, &friend_id, Utc::now())?
                    .ok_or_else(|| ServiceError::ChatConflict(chat_id_for(&user_id, &friend_id)))?;
                Ok((chat_id, (user_id, friend_id)))
            })
            .await?;

        self.notify(ChatChange {
            chat_id: chat_id.clone(),
            participants,
        });
        Ok(chat_id)
    }

    fn subscribe_to_messages(
        &self,
        chat_id: &str,
        sink: FeedSink<Vec<ChatMessage>>,
    ) -> Subscription {
        let query_chat = chat_id.to_string();
        let watch_chat = chat_id.to_string();
        self.spawn_feed(
            sink,
            move |db| Ok(db.messages_in(&query_chat)?),
            move |change| change.chat_id == watch_chat,
        )
    }

    async fn send_message(
        &self,
        chat_id: &str,
        sender_id: &str,
        content: &str,
    ) -> Result<ChatMessage, ServiceError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ServiceError::EmptyMessage);
        }

        let message = ChatMessage {
            id: Uuid::new_v4().to_string(),
            chat_id: chat_id.to_string(),
            sender_id: sender_id.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
            read: false,
        };

        let stored = message.clone();
        let participants = self
            .with_db(move |db| {
                let participants = db
                    .chat_participants(&stored.chat_id)?
                    .ok_or_else(|| ServiceError::UnknownChat(stored.chat_id.clone()))?;
                if participants.0 != stored.sender_id && participants.1 != stored.sender_id {
                    return Err(ServiceError::UnknownUser(stored.sender_id.clone()));
                }
                db.insert_message(&stored)?;
                Ok(participants)
            })
            .await?;

        log::debug!("Stored message {} in chat {}", message.id, message.chat_id);
        self.notify(ChatChange {
            chat_id: message.chat_id.clone(),
            participants,
        });
        Ok(message)
    }

    async fn mark_read(&self, chat_id: &str, user_id: &str) -> Result<(), ServiceError> {
        let chat_id = chat_id.to_string();
        let user_id = user_id.to_string();
        let change = self
            .with_db(move |db| {
                let participants = db
                    .chat_participants(&chat_id)?
                    .ok_or_else(|| ServiceError::UnknownChat(chat_id.clone()))?;
                let touched = db.mark_read(&chat_id, &user_id)?;
                Ok((touched > 0).then_some(ChatChange {
                    chat_id,
                    participants,
                }))
            })
            .await?;

        if let Some(change) = change {
            self.notify(change);
        }
        Ok(())
    }
}

fn lock(db: &Mutex<ChatDatabase>) -> Result<MutexGuard<'_, ChatDatabase>, ServiceError> {
    db.lock()
        .map_err(|_| ServiceError::Task("database lock poisoned".to_string()))
}

async fn run_query<T, Q>(db: &Arc<Mutex<ChatDatabase>>, query: &Arc<Q>) -> Result<T, ServiceError>
where
    T: Send + 'static,
    Q: Fn(&ChatDatabase) -> Result<T, ServiceError> + Send + Sync + 'static,
{
    let db = Arc::clone(db);
    let query = Arc::clone(query);
    tokio::task::spawn_blocking(move || {
        let guard = lock(&db)?;
        query(&*guard)
    })
    .await?
}
