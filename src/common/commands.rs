use super::types::Friend;

/// Which list the home screen shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HomeView {
    #[default]
    Friends,
    Chats,
}

/// What the user asked for, as reported by a render function.
#[derive(Debug, Clone, PartialEq)]
pub enum HomeIntent {
    ShowView(HomeView),
    /// Replace the home screen with the chat screen for this friend.
    StartChat(Friend),
    /// Return from the chat screen.
    LeaveChat,
    OpenProfile(Friend),
    CloseProfile,
}
