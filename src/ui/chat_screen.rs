use std::sync::Arc;

use eframe::egui;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::components::{avatar, chat_area, input_bar};
use super::theme;
use crate::common::{ChatMessage, FeedEvent, Friend, HomeIntent};
use crate::service::{DataService, ServiceError, Subscription};

const FEED_BUFFER: usize = 32;

/// Conversation with one friend. Replaces the home screen while open.
///
/// Dropping the screen releases the message feed and aborts the open request
/// if it is still in flight. Sends already issued run to completion.
pub struct ChatScreen {
    service: Arc<dyn DataService>,
    runtime: Handle,
    user_id: String,
    friend: Friend,
    chat_id: Option<String>,
    messages: Vec<ChatMessage>,
    input_text: String,
    notice: Option<String>,
    opening: Option<oneshot::Receiver<Result<String, ServiceError>>>,
    feed: Option<(mpsc::Receiver<FeedEvent<Vec<ChatMessage>>>, Subscription)>,
    open_task: JoinHandle<()>,
}

impl ChatScreen {
    pub fn open(
        service: Arc<dyn DataService>,
        runtime: Handle,
        user_id: impl Into<String>,
        friend: Friend,
    ) -> Self {
        let user_id = user_id.into();
        let (tx, rx) = oneshot::channel();
        let open_task = {
            let service = Arc::clone(&service);
            let user_id = user_id.clone();
            let friend_id = friend.id.clone();
            runtime.spawn(async move {
                let _ = tx.send(service.open_chat(&user_id, &friend_id).await);
            })
        };
        log::info!("Opening chat between {} and {}", user_id, friend.id);

        Self {
            service,
            runtime,
            user_id,
            friend,
            chat_id: None,
            messages: Vec::new(),
            input_text: String::new(),
            notice: None,
            opening: Some(rx),
            feed: None,
            open_task,
        }
    }

    pub fn friend(&self) -> &Friend {
        &self.friend
    }

    pub fn chat_id(&self) -> Option<&str> {
        self.chat_id.as_deref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Apply whatever the background work delivered since the last frame.
    pub fn pump(&mut self) {
        if let Some(rx) = self.opening.as_mut() {
            match rx.try_recv() {
                Ok(Ok(chat_id)) => {
                    self.opening = None;
                    self.attach(chat_id);
                }
                Ok(Err(err)) => {
                    self.opening = None;
                    log::error!("Failed to open chat with {}: {err}", self.friend.id);
                    self.notice = Some(format!("Could not open chat: {err}"));
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => self.opening = None,
            }
        }

        let mut events = Vec::new();
        if let Some((rx, _)) = self.feed.as_mut() {
            while let Ok(event) = rx.try_recv() {
                events.push(event);
            }
        }
        for event in events {
            match event {
                FeedEvent::Snapshot(messages) => {
                    let unread = messages
                        .iter()
                        .any(|message| message.sender_id != self.user_id && !message.read);
                    self.messages = messages;
                    self.notice = None;
                    if unread {
                        self.mark_read();
                    }
                }
                FeedEvent::Failed(err) => {
                    log::error!("Message feed failed: {err}");
                    self.notice = Some("Live updates unavailable".to_string());
                }
            }
        }
    }

    fn attach(&mut self, chat_id: String) {
        let (tx, rx) = mpsc::channel(FEED_BUFFER);
        let subscription = {
            let _guard = self.runtime.enter();
            self.service.subscribe_to_messages(&chat_id, tx)
        };
        self.feed = Some((rx, subscription));
        self.chat_id = Some(chat_id);
        self.mark_read();
    }

    fn mark_read(&self) {
        let Some(chat_id) = self.chat_id.clone() else {
            return;
        };
        let service = Arc::clone(&self.service);
        let user_id = self.user_id.clone();
        self.runtime.spawn(async move {
            if let Err(err) = service.mark_read(&chat_id, &user_id).await {
                log::warn!("Failed to mark chat {chat_id} read: {err}");
            }
        });
    }

    pub fn send(&self, content: String) {
        let Some(chat_id) = self.chat_id.clone() else {
            log::warn!("Chat with {} is not open yet; dropping message", self.friend.id);
            return;
        };
        let service = Arc::clone(&self.service);
        let sender_id = self.user_id.clone();
        self.runtime.spawn(async move {
            match service.send_message(&chat_id, &sender_id, &content).await {
                Ok(message) => log::debug!("Sent message {}", message.id),
                Err(err) => log::error!("Failed to send message to {chat_id}: {err}"),
            }
        });
    }

    pub fn show(&mut self, ctx: &egui::Context) -> Option<HomeIntent> {
        let mut intent = None;

        egui::TopBottomPanel::top("chat_header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("⬅ Back").clicked() {
                    intent = Some(HomeIntent::LeaveChat);
                }
                avatar::render(ui, &self.friend.name, &self.friend.avatar, 32.0);
                ui.vertical(|ui| {
                    ui.strong(&self.friend.name);
                    ui.colored_label(theme::TEXT_SECONDARY, format!("@{}", self.friend.username));
                });
            });
        });

        let mut outgoing = None;
        egui::TopBottomPanel::bottom("chat_input").show(ctx, |ui| {
            if let Some(notice) = &self.notice {
                ui.colored_label(theme::WARNING, notice);
            }
            outgoing = input_bar::render(ui, &mut self.input_text, self.chat_id.is_some());
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.chat_id.is_none() && self.opening.is_some() {
                ui.spinner();
                return;
            }
            chat_area::render(ui, &self.messages, &self.user_id, &self.friend.name);
        });

        if let Some(content) = outgoing {
            self.send(content);
        }
        intent
    }
}

impl Drop for ChatScreen {
    fn drop(&mut self) {
        self.open_task.abort();
        if let Some((_, subscription)) = &self.feed {
            subscription.unsubscribe();
        }
        log::debug!("Closed chat with {}", self.friend.id);
    }
}
