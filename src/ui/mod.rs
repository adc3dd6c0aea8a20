pub mod app;
pub mod chat_screen;
pub mod components;
pub mod home;
pub mod state;
pub mod theme;

pub use app::ChatApp;
pub use home::Home;
pub use state::{HomeState, Screen};
