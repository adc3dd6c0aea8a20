use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use friend_chat::common::{
    Chat, ChatMessage, FeedEvent, Friend, HomeIntent, HomeView, User,
};
use friend_chat::service::{
    DataService, FeedSink, LocalDataService, ServiceError, Subscription,
};
use friend_chat::storage::{ChatDatabase, seed_demo_data};
use friend_chat::ui::{Home, Screen};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

fn seeded_service() -> Arc<LocalDataService> {
    let mut db = ChatDatabase::in_memory().unwrap();
    seed_demo_data(&mut db).unwrap();
    Arc::new(LocalDataService::new(db))
}

fn home_for(service: Arc<dyn DataService>, user_id: &str) -> Home {
    Home::new(service, Handle::current(), User::new(user_id, None))
}

async fn pump_until<F>(home: &mut Home, mut done: F) -> bool
where
    F: FnMut(&Home) -> bool,
{
    for _ in 0..300 {
        home.pump();
        if done(home) {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    false
}

fn friend_named<'a>(home: &'a Home, id: &str) -> &'a Friend {
    home.state()
        .friends
        .iter()
        .find(|friend| friend.id == id)
        .unwrap()
}

#[tokio::test]
async fn test_home_loads_friends_and_chats() {
    let mut home = home_for(seeded_service(), "alice");
    assert!(home.state().loading);

    assert!(pump_until(&mut home, |home| !home.state().loading).await);
    let names: Vec<_> = home
        .state()
        .friends
        .iter()
        .map(|friend| friend.name.as_str())
        .collect();
    assert_eq!(names, vec!["Bob Chen", "Carol Diaz", "Dave Okafor"]);

    assert!(pump_until(&mut home, |home| home.state().chats.len() == 2).await);
    assert_eq!(home.state().chats[0].other_user.id, "bob");
    assert_eq!(home.state().chats[0].unread_count, 2);
}

#[tokio::test]
async fn test_unknown_user_resolves_to_empty_friends() {
    let mut home = home_for(seeded_service(), "ghost");
    assert!(pump_until(&mut home, |home| !home.state().loading).await);
    assert!(home.state().friends.is_empty());
}

#[tokio::test]
async fn test_start_chat_and_return_keeps_view() {
    let mut home = home_for(seeded_service(), "alice");
    assert!(pump_until(&mut home, |home| !home.state().loading).await);

    home.dispatch(HomeIntent::ShowView(HomeView::Chats));
    let bob = friend_named(&home, "bob").clone();
    home.dispatch(HomeIntent::StartChat(bob.clone()));
    assert_eq!(home.state().screen(), Screen::Chat(&bob));
    assert_eq!(home.chat_screen().unwrap().friend(), &bob);

    assert!(
        pump_until(&mut home, |home| {
            home.chat_screen()
                .is_some_and(|screen| screen.messages().len() == 3)
        })
        .await
    );

    // Opening the chat marks Bob's messages read, which reaches the chat feed.
    assert!(
        pump_until(&mut home, |home| {
            home.state()
                .chats
                .iter()
                .any(|chat| chat.other_user.id == "bob" && chat.unread_count == 0)
        })
        .await
    );

    home.dispatch(HomeIntent::LeaveChat);
    assert_eq!(home.state().screen(), Screen::Main);
    assert_eq!(home.state().view, HomeView::Chats);
    assert!(home.chat_screen().is_none());
}

#[tokio::test]
async fn test_sent_message_reaches_chat_list() {
    let mut home = home_for(seeded_service(), "alice");
    assert!(pump_until(&mut home, |home| !home.state().loading).await);

    let carol = friend_named(&home, "carol").clone();
    home.dispatch(HomeIntent::StartChat(carol));
    assert!(
        pump_until(&mut home, |home| {
            home.chat_screen()
                .is_some_and(|screen| screen.chat_id() == Some("alice_carol"))
        })
        .await
    );

    home.chat_screen_mut()
        .unwrap()
        .send("Dinner on Friday?".to_string());

    assert!(
        pump_until(&mut home, |home| {
            home.state().chats.iter().any(|chat| {
                chat.other_user.id == "carol"
                    && chat.last_message.as_deref() == Some("Dinner on Friday?")
            })
        })
        .await
    );
    assert_eq!(home.state().chats[0].other_user.id, "carol");
}

#[tokio::test]
async fn test_profile_popup_open_and_close() {
    let mut home = home_for(seeded_service(), "alice");
    assert!(pump_until(&mut home, |home| !home.state().loading).await);

    let dave = friend_named(&home, "dave").clone();
    assert_eq!(dave.friend_count(), 2);
    home.dispatch(HomeIntent::OpenProfile(dave.clone()));
    assert_eq!(home.state().visible_profile(), Some(&dave));
    assert_eq!(home.state().screen(), Screen::Main);

    home.dispatch(HomeIntent::CloseProfile);
    assert!(home.state().visible_profile().is_none());
}

#[tokio::test]
async fn test_set_user_resubscribes() {
    let mut home = home_for(seeded_service(), "alice");
    assert!(pump_until(&mut home, |home| home.state().chats.len() == 2).await);
    home.dispatch(HomeIntent::ShowView(HomeView::Chats));

    home.set_user(User::new("alice", Some("Alice".to_string())));
    assert_eq!(home.user().label(), "Alice");
    assert_eq!(home.state().view, HomeView::Chats);

    home.set_user(User::new("erin", None));
    assert!(home.state().loading);
    assert!(home.state().chats.is_empty());
    assert_eq!(home.state().view, HomeView::Friends);

    assert!(pump_until(&mut home, |home| !home.state().loading).await);
    let ids: Vec<_> = home
        .state()
        .friends
        .iter()
        .map(|friend| friend.id.as_str())
        .collect();
    assert_eq!(ids, vec!["dave"]);

    sleep(Duration::from_millis(50)).await;
    home.pump();
    assert!(home.state().chats.is_empty());
}

/// Never answers; every task it starts holds a clone of `alive` until aborted.
struct StalledService {
    alive: mpsc::Sender<()>,
}

#[async_trait]
impl DataService for StalledService {
    async fn get_friends(&self, _user_id: &str) -> Result<Vec<Friend>, ServiceError> {
        let _alive = self.alive.clone();
        std::future::pending().await
    }

    fn subscribe_to_chats(&self, _user_id: &str, sink: FeedSink<Vec<Chat>>) -> Subscription {
        let alive = self.alive.clone();
        Subscription::new(tokio::spawn(async move {
            let _alive = alive;
            let _sink = sink;
            std::future::pending::<()>().await
        }))
    }

    async fn open_chat(&self, _user_id: &str, _friend_id: &str) -> Result<String, ServiceError> {
        Err(ServiceError::Task("not supported".to_string()))
    }

    fn subscribe_to_messages(
        &self,
        _chat_id: &str,
        _sink: FeedSink<Vec<ChatMessage>>,
    ) -> Subscription {
        Subscription::new(tokio::spawn(async {}))
    }

    async fn send_message(
        &self,
        _chat_id: &str,
        _sender_id: &str,
        _content: &str,
    ) -> Result<ChatMessage, ServiceError> {
        Err(ServiceError::Task("not supported".to_string()))
    }

    async fn mark_read(&self, _chat_id: &str, _user_id: &str) -> Result<(), ServiceError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_unmount_releases_fetch_and_feed() {
    let (alive, mut released) = mpsc::channel(1);
    let service: Arc<dyn DataService> = Arc::new(StalledService { alive });

    let mut home = home_for(Arc::clone(&service), "alice");
    sleep(Duration::from_millis(20)).await;
    home.pump();
    assert!(home.state().loading);

    drop(home);
    drop(service);

    let closed = timeout(Duration::from_secs(1), released.recv()).await;
    assert_eq!(closed.unwrap(), None);
}

/// Fails the friends fetch and delivers one snapshot followed by a feed failure.
struct FlakyService;

#[async_trait]
impl DataService for FlakyService {
    async fn get_friends(&self, user_id: &str) -> Result<Vec<Friend>, ServiceError> {
        Err(ServiceError::UnknownUser(user_id.to_string()))
    }

    fn subscribe_to_chats(&self, user_id: &str, sink: FeedSink<Vec<Chat>>) -> Subscription {
        let chat = Chat {
            id: format!("{user_id}_zed"),
            other_user: Friend {
                id: "zed".to_string(),
                name: "Zed".to_string(),
                username: "zed".to_string(),
                avatar: String::new(),
                bio: None,
                email: None,
                friends: None,
            },
            last_message: None,
            last_message_at: None,
            unread_count: 0,
        };
        Subscription::new(tokio::spawn(async move {
            let _ = sink.send(FeedEvent::Snapshot(vec![chat])).await;
            let _ = sink.send(FeedEvent::Failed("stream reset".to_string())).await;
        }))
    }

    async fn open_chat(&self, _user_id: &str, _friend_id: &str) -> Result<String, ServiceError> {
        Err(ServiceError::Task("not supported".to_string()))
    }

    fn subscribe_to_messages(
        &self,
        _chat_id: &str,
        _sink: FeedSink<Vec<ChatMessage>>,
    ) -> Subscription {
        Subscription::new(tokio::spawn(async {}))
    }

    async fn send_message(
        &self,
        _chat_id: &str,
        _sender_id: &str,
        _content: &str,
    ) -> Result<ChatMessage, ServiceError> {
        Err(ServiceError::Task("not supported".to_string()))
    }

    async fn mark_read(&self, _chat_id: &str, _user_id: &str) -> Result<(), ServiceError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_failures_degrade_without_blocking() {
    let mut home = home_for(Arc::new(FlakyService), "alice");
    assert!(
        pump_until(&mut home, |home| {
            !home.state().loading && home.state().chat_feed_error.is_some()
        })
        .await
    );
    assert!(home.state().friends.is_empty());
    assert_eq!(home.state().chats.len(), 1);
    assert_eq!(home.state().chat_feed_error.as_deref(), Some("stream reset"));
}
