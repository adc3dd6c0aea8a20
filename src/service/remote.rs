use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::time::MissedTickBehavior;

use super::{DataService, FeedSink, ServiceError, Subscription};
use crate::common::{Chat, ChatMessage, FeedEvent, Friend, chat_id_for};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Data service talking to a JSON HTTP backend.
///
/// Live feeds are polled; a snapshot is pushed only when the payload changed,
/// and a failure is reported once per run of failed polls.
pub struct RemoteDataService {
    client: reqwest::Client,
    base_url: String,
    poll_interval: Duration,
}

impl RemoteDataService {
    pub fn new(base_url: impl Into<String>, poll_interval: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            poll_interval,
        }
    }

    /// Base url with `segments` appended, each one percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| ServiceError::InvalidUrl(format!("{}: {err}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| ServiceError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn spawn_feed<T>(&self, segments: &[&str], sink: FeedSink<T>) -> Subscription
    where
        T: DeserializeOwned + PartialEq + Clone + Send + 'static,
    {
        match self.endpoint(segments) {
            Ok(url) => self.spawn_poll(url, sink),
            Err(err) => {
                log::error!("Cannot start feed: {err}");
                Subscription::new(tokio::spawn(async move {
                    let _ = sink.send(FeedEvent::Failed(err.to_string())).await;
                }))
            }
        }
    }

    fn spawn_poll<T>(&self, url: Url, sink: FeedSink<T>) -> Subscription
    where
        T: DeserializeOwned + PartialEq + Clone + Send + 'static,
    {
        let client = self.client.clone();
        let poll_interval = self.poll_interval;

        Subscription::new(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last: Option<T> = None;
            let mut failing = false;

            loop {
                ticker.tick().await;
                let event = match fetch_json::<T>(&client, url.clone()).await {
                    Ok(snapshot) => {
                        let recovered = std::mem::replace(&mut failing, false);
                        if !recovered && last.as_ref() == Some(&snapshot) {
                            continue;
                        }
                        last = Some(snapshot.clone());
                        FeedEvent::Snapshot(snapshot)
                    }
                    Err(err) => {
                        if failing {
                            continue;
                        }
                        failing = true;
                        log::warn!("Polling {url} failed: {err}");
                        FeedEvent::Failed(err.to_string())
                    }
                };

                if sink.send(event).await.is_err() {
                    log::debug!("Feed receiver dropped; stopping poll of {url}");
                    return;
                }
            }
        }))
    }
}

#[async_trait]
impl DataService for RemoteDataService {
    async fn get_friends(&self, user_id: &str) -> Result<Vec<Friend>, ServiceError> {
        fetch_json(&self.client, self.endpoint(&["users", user_id, "friends"])?).await
    }

    fn subscribe_to_chats(&self, user_id: &str, sink: FeedSink<Vec<Chat>>) -> Subscription {
        self.spawn_feed(&["users", user_id, "chats"], sink)
    }

    async fn open_chat(&self, user_id: &str, friend_id: &str) -> Result<String, ServiceError> {
        let chat_id = chat_id_for(user_id, friend_id);
        self.client
            .put(self.endpoint(&["chats", &chat_id])?)
            .json(&json!({ "participants": [user_id, friend_id] }))
            .send()
            .await?
            .error_for_status()?;
        Ok(chat_id)
    }

    fn subscribe_to_messages(
        &self,
        chat_id: &str,
        sink: FeedSink<Vec<ChatMessage>>,
    ) -> Subscription {
        self.spawn_feed(&["chats", chat_id, "messages"], sink)
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

        let message = self
            .client
            .post(self.endpoint(&["chats", chat_id, "messages"])?)
            .json(&json!({ "sender_id": sender_id, "content": content }))
            .send()
            .await?
            .error_for_status()?
            .json::<ChatMessage>()
            .await?;
        Ok(message)
    }

    async fn mark_read(&self, chat_id: &str, user_id: &str) -> Result<(), ServiceError> {
        self.client
            .post(self.endpoint(&["chats", chat_id, "read"])?)
            .json(&json!({ "user_id": user_id }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

async fn fetch_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: Url,
) -> Result<T, ServiceError> {
    let value = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json::<T>()
        .await?;
    Ok(value)
}
