use crate::common::{Chat, Friend, HomeIntent, HomeView};
use crate::service::ServiceError;

/// What the home controller renders this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Screen<'a> {
    Main,
    Chat(&'a Friend),
}

/// Local state of the home screen. Never persisted.
#[derive(Debug, Clone)]
pub struct HomeState {
    pub view: HomeView,
    pub friends: Vec<Friend>,
    pub chats: Vec<Chat>,
    pub loading: bool,
    /// Set while the chat feed is failing; the last good chats stay visible.
    pub chat_feed_error: Option<String>,
    selected_friend: Option<Friend>,
    selected_profile: Option<Friend>,
    show_profile: bool,
}

impl HomeState {
    pub fn new() -> Self {
        Self {
            view: HomeView::default(),
            friends: Vec::new(),
            chats: Vec::new(),
            loading: true,
            chat_feed_error: None,
            selected_friend: None,
            selected_profile: None,
            show_profile: false,
        }
    }

    pub fn apply(&mut self, intent: HomeIntent) {
        match intent {
            HomeIntent::ShowView(view) => self.view = view,
            HomeIntent::StartChat(friend) => self.selected_friend = Some(friend),
            HomeIntent::LeaveChat => self.selected_friend = None,
            HomeIntent::OpenProfile(friend) => {
                self.selected_profile = Some(friend);
                self.show_profile = true;
            }
            HomeIntent::CloseProfile => {
                self.show_profile = false;
                self.selected_profile = None;
            }
        }
    }

    pub fn screen(&self) -> Screen<'_> {
        match &self.selected_friend {
            Some(friend) => Screen::Chat(friend),
            None => Screen::Main,
        }
    }

    pub fn selected_friend(&self) -> Option<&Friend> {
        self.selected_friend.as_ref()
    }

    /// The profile popup is shown only when both the flag and the profile are set.
    pub fn visible_profile(&self) -> Option<&Friend> {
        if self.show_profile {
            self.selected_profile.as_ref()
        } else {
            None
        }
    }

    /// Settle the one-shot friends fetch. Failures degrade to an empty list.
    pub fn friends_loaded(&mut self, result: Result<Vec<Friend>, ServiceError>) {
        match result {
            Ok(friends) => {
                log::info!("Loaded {} friends", friends.len());
                self.friends = friends;
            }
            Err(err) => {
                log::error!("Failed to load friends: {err}");
                self.friends.clear();
            }
        }
        self.loading = false;
    }

    pub fn chats_snapshot(&mut self, chats: Vec<Chat>) {
        self.chats = chats;
        self.chat_feed_error = None;
    }

    pub fn chat_feed_failed(&mut self, message: String) {
        log::error!("Chat feed failed: {message}");
        self.chat_feed_error = Some(message);
    }
}

impl Default for HomeState {
    fn default() -> Self {
        Self::new()
    }
}
