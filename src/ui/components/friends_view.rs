use eframe::egui;

use super::avatar;
use crate::common::{Friend, HomeIntent};
use crate::ui::theme;

pub const LOADING_TEXT: &str = "Loading friends...";
pub const EMPTY_TEXT: &str = "No friends yet. Add someone to start chatting!";

const CARD_SIZE: egui::Vec2 = egui::vec2(200.0, 150.0);

/// Which interactive region of a friend card received the click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardRegion {
    Body,
    ChatAction,
}

#[derive(Debug, PartialEq)]
pub struct FriendCard<'a> {
    pub friend: &'a Friend,
    pub handle: String,
    pub bio: Option<&'a str>,
}

#[derive(Debug, PartialEq)]
pub enum FriendsLayout<'a> {
    Loading,
    Empty,
    Grid(Vec<FriendCard<'a>>),
}

/// Loading wins over empty, empty wins over the grid.
pub fn layout(friends: &[Friend], loading: bool) -> FriendsLayout<'_> {
    if loading {
        return FriendsLayout::Loading;
    }
    if friends.is_empty() {
        return FriendsLayout::Empty;
    }
    FriendsLayout::Grid(
        friends
            .iter()
            .map(|friend| FriendCard {
                friend,
                handle: format!("@{}", friend.username),
                bio: friend.bio.as_deref().filter(|bio| !bio.trim().is_empty()),
            })
            .collect(),
    )
}

/// The chat action never also opens the profile.
pub fn card_intent(friend: &Friend, region: CardRegion) -> HomeIntent {
    match region {
        CardRegion::ChatAction => HomeIntent::StartChat(friend.clone()),
        CardRegion::Body => HomeIntent::OpenProfile(friend.clone()),
    }
}

pub fn render(ui: &mut egui::Ui, friends: &[Friend], loading: bool) -> Option<HomeIntent> {
    let cards = match layout(friends, loading) {
        FriendsLayout::Loading => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(LOADING_TEXT);
            });
            return None;
        }
        FriendsLayout::Empty => {
            ui.label(egui::RichText::new(EMPTY_TEXT).color(theme::TEXT_SECONDARY));
            return None;
        }
        FriendsLayout::Grid(cards) => cards,
    };

    let mut intent = None;
    egui::ScrollArea::vertical().show(ui, |ui| {
        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing = egui::vec2(12.0, 12.0);
            for card in &cards {
                if let Some(region) = render_card(ui, card) {
                    intent = Some(card_intent(card.friend, region));
                }
            }
        });
    });
    intent
}

fn render_card(ui: &mut egui::Ui, card: &FriendCard<'_>) -> Option<CardRegion> {
    let (body, chat) = draw_card(ui, card);
    clicked_region(&body, &chat)
}

/// Paints one card and returns the responses of its body and chat button.
fn draw_card(ui: &mut egui::Ui, card: &FriendCard<'_>) -> (egui::Response, egui::Response) {
    // The body is registered first so the chat button sits above it.
    let (rect, body) = ui.allocate_exact_size(CARD_SIZE, egui::Sense::click());
    let fill = if body.hovered() {
        theme::CARD_HOVER
    } else {
        theme::CARD_BG
    };
    ui.painter().rect(
        rect,
        egui::CornerRadius::same(10),
        fill,
        egui::Stroke::new(1.0, theme::CARD_STROKE),
        egui::StrokeKind::Inside,
    );

    let inner = rect.shrink(12.0);
    let chat = ui
        .scope_builder(egui::UiBuilder::new().max_rect(inner), |ui| {
            ui.vertical_centered(|ui| {
                avatar::render(ui, &card.friend.name, &card.friend.avatar, 40.0);
                ui.label(egui::RichText::new(&card.friend.name).strong());
                ui.label(egui::RichText::new(&card.handle).color(theme::TEXT_SECONDARY));
                if let Some(bio) = card.bio {
                    ui.add(egui::Label::new(egui::RichText::new(bio).small()).truncate());
                }
                ui.add(egui::Button::new("💬 Chat").fill(theme::ACCENT))
            })
            .inner
        })
        .inner;

    (body, chat)
}

/// A click on the chat button counts only as the chat action, even if the body saw it too.
fn clicked_region(body: &egui::Response, chat: &egui::Response) -> Option<CardRegion> {
    let clicked_on_chat = body
        .interact_pointer_pos()
        .is_some_and(|pos| chat.rect.contains(pos));
    if chat.clicked() || (body.clicked() && clicked_on_chat) {
        Some(CardRegion::ChatAction)
    } else if body.clicked() {
        Some(CardRegion::Body)
    } else {
        None
    }
}
