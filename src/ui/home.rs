use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::chat_screen::ChatScreen;
use super::components::{chats_view, friends_view, profile_popup};
use super::state::{HomeState, Screen};
use crate::common::{Chat, FeedEvent, Friend, HomeIntent, HomeView, User};
use crate::service::{DataService, ServiceError, Subscription};

const FEED_BUFFER: usize = 32;
const REPAINT_INTERVAL: Duration = Duration::from_millis(250);

/// Background work tied to one user id: the friends fetch and the chat feed.
struct Mount {
    user_id: String,
    friends: Option<oneshot::Receiver<Result<Vec<Friend>, ServiceError>>>,
    fetch: JoinHandle<()>,
    chats: mpsc::Receiver<FeedEvent<Vec<Chat>>>,
    subscription: Subscription,
}

impl Mount {
    fn start(service: &Arc<dyn DataService>, runtime: &Handle, user_id: &str) -> Self {
        log::info!("Mounting home screen for {user_id}");

        let (friends_tx, friends_rx) = oneshot::channel();
        let fetch = {
            let service = Arc::clone(service);
            let user_id = user_id.to_string();
            runtime.spawn(async move {
                let _ = friends_tx.send(service.get_friends(&user_id).await);
            })
        };

        let (chats_tx, chats_rx) = mpsc::channel(FEED_BUFFER);
        let subscription = {
            let _guard = runtime.enter();
            service.subscribe_to_chats(user_id, chats_tx)
        };

        Self {
            user_id: user_id.to_string(),
            friends: Some(friends_rx),
            fetch,
            chats: chats_rx,
            subscription,
        }
    }
}

impl Drop for Mount {
    fn drop(&mut self) {
        self.fetch.abort();
        self.subscription.unsubscribe();
        log::info!("Unmounted home screen for {}", self.user_id);
    }
}

/// Home screen controller: friends, chats, profile popup, and the chat screen it swaps to.
pub struct Home {
    service: Arc<dyn DataService>,
    runtime: Handle,
    user: User,
    state: HomeState,
    mount: Mount,
    chat_screen: Option<ChatScreen>,
}

impl Home {
    /// Creates the controller and immediately starts the friends fetch and chat feed.
    pub fn new(service: Arc<dyn DataService>, runtime: Handle, user: User) -> Self {
        let mount = Mount::start(&service, &runtime, &user.id);
        Self {
            service,
            runtime,
            user,
            state: HomeState::new(),
            mount,
            chat_screen: None,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn state(&self) -> &HomeState {
        &self.state
    }

    pub fn chat_screen(&self) -> Option<&ChatScreen> {
        self.chat_screen.as_ref()
    }

    pub fn chat_screen_mut(&mut self) -> Option<&mut ChatScreen> {
        self.chat_screen.as_mut()
    }

    /// Switching to another id tears down the old feed and starts over.
    pub fn set_user(&mut self, user: User) {
        if user.id == self.user.id {
            self.user = user;
            return;
        }

        self.chat_screen = None;
        self.state = HomeState::new();
        self.mount = Mount::start(&self.service, &self.runtime, &user.id);
        self.user = user;
    }

    /// Apply results delivered by background work since the last call.
    pub fn pump(&mut self) {
        if let Some(rx) = self.mount.friends.as_mut() {
            match rx.try_recv() {
                Ok(result) => {
                    self.mount.friends = None;
                    self.state.friends_loaded(result);
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.mount.friends = None;
                    self.state.friends_loaded(Err(ServiceError::Task(
                        "friends fetch ended without a result".to_string(),
                    )));
                }
            }
        }

        while let Ok(event) = self.mount.chats.try_recv() {
            match event {
                FeedEvent::Snapshot(chats) => self.state.chats_snapshot(chats),
                FeedEvent::Failed(err) => self.state.chat_feed_failed(err),
            }
        }

        if let Some(screen) = self.chat_screen.as_mut() {
            screen.pump();
        }
    }

    pub fn dispatch(&mut self, intent: HomeIntent) {
        match &intent {
            HomeIntent::StartChat(friend) => {
                self.chat_screen = Some(ChatScreen::open(
                    Arc::clone(&self.service),
                    self.runtime.clone(),
                    self.user.id.clone(),
                    friend.clone(),
                ));
            }
            HomeIntent::LeaveChat => self.chat_screen = None,
            _ => {}
        }
        self.state.apply(intent);
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        self.pump();

        let in_chat = matches!(self.state.screen(), Screen::Chat(_));
        let intents = if in_chat {
            self.chat_screen
                .as_mut()
                .and_then(|screen| screen.show(ctx))
                .into_iter()
                .collect()
        } else {
            self.show_main(ctx)
        };

        for intent in intents {
            self.dispatch(intent);
        }

        ctx.request_repaint_after(REPAINT_INTERVAL);
    }

    fn show_main(&self, ctx: &egui::Context) -> Vec<HomeIntent> {
        let mut intents = Vec::new();
        let state = &self.state;

        egui::TopBottomPanel::top("home_header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(format!("Hi, {}", self.user.label()));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let unread: u32 = state.chats.iter().map(|chat| chat.unread_count).sum();
                    let chats_label = if unread > 0 {
                        format!("Chats ({unread})")
                    } else {
                        "Chats".to_string()
                    };
                    if ui
                        .selectable_label(state.view == HomeView::Chats, chats_label)
                        .clicked()
                    {
                        intents.push(HomeIntent::ShowView(HomeView::Chats));
                    }
                    if ui
                        .selectable_label(state.view == HomeView::Friends, "Friends")
                        .clicked()
                    {
                        intents.push(HomeIntent::ShowView(HomeView::Friends));
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let intent = match state.view {
                HomeView::Friends => friends_view::render(ui, &state.friends, state.loading),
                HomeView::Chats => chats_view::render(
                    ui,
                    &state.chats,
                    state.loading,
                    state.chat_feed_error.as_deref(),
                ),
            };
            intents.extend(intent);
        });

        if let Some(friend) = state.visible_profile() {
            intents.extend(profile_popup::render(ctx, friend));
        }

        intents
    }
}
