pub mod avatar;
pub mod chat_area;
pub mod chats_view;
pub mod friends_view;
pub mod input_bar;
pub mod profile_popup;
