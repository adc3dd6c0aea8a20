use std::fmt::Display;

use chrono::{DateTime, Datelike, Local, TimeZone, Utc};
use eframe::egui;

use super::avatar;
use crate::common::{Chat, HomeIntent};
use crate::ui::theme;

pub const LOADING_TEXT: &str = "Loading chats...";
pub const EMPTY_TEXT: &str = "No active chats. Pick a friend to say hello!";
pub const NO_ACTIVITY_TEXT: &str = "New chat";
pub const NO_MESSAGE_TEXT: &str = "No messages yet";

const ROW_HEIGHT: f32 = 64.0;

#[derive(Debug, PartialEq)]
pub struct ChatRow<'a> {
    pub chat: &'a Chat,
    pub activity: String,
    pub preview: &'a str,
    /// Present only when there is something unread.
    pub badge: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum ChatsLayout<'a> {
    Loading,
    Empty,
    Rows(Vec<ChatRow<'a>>),
}

pub fn layout<Tz>(chats: &[Chat], loading: bool, now: DateTime<Tz>) -> ChatsLayout<'_>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if loading {
        return ChatsLayout::Loading;
    }
    if chats.is_empty() {
        return ChatsLayout::Empty;
    }
    ChatsLayout::Rows(
        chats
            .iter()
            .map(|chat| ChatRow {
                chat,
                activity: format_last_activity(chat.last_message_at, &now),
                preview: chat
                    .last_message
                    .as_deref()
                    .filter(|text| !text.is_empty())
                    .unwrap_or(NO_MESSAGE_TEXT),
                badge: (chat.unread_count > 0).then(|| chat.unread_count.to_string()),
            })
            .collect(),
    )
}

/// `HH:MM` for today, `Mon D` for this year, the full date otherwise.
pub fn format_last_activity<Tz>(at: Option<DateTime<Utc>>, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let Some(at) = at else {
        return NO_ACTIVITY_TEXT.to_string();
    };
    let at = at.with_timezone(&now.timezone());
    if at.date_naive() == now.date_naive() {
        at.format("%H:%M").to_string()
    } else if at.year() == now.year() {
        at.format("%b %-d").to_string()
    } else {
        at.format("%Y-%m-%d").to_string()
    }
}

pub fn render(
    ui: &mut egui::Ui,
    chats: &[Chat],
    loading: bool,
    feed_error: Option<&str>,
) -> Option<HomeIntent> {
    if let Some(err) = feed_error {
        ui.colored_label(theme::WARNING, "⚠ Live updates unavailable; showing last known chats")
            .on_hover_text(err);
    }

    let rows = match layout(chats, loading, Local::now()) {
        ChatsLayout::Loading => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(LOADING_TEXT);
            });
            return None;
        }
        ChatsLayout::Empty => {
            ui.label(egui::RichText::new(EMPTY_TEXT).color(theme::TEXT_SECONDARY));
            return None;
        }
        ChatsLayout::Rows(rows) => rows,
    };

    let mut intent = None;
    egui::ScrollArea::vertical().show(ui, |ui| {
        for row in &rows {
            if render_row(ui, row).clicked() {
                intent = Some(HomeIntent::StartChat(row.chat.other_user.clone()));
            }
        }
    });
    intent
}

fn render_row(ui: &mut egui::Ui, row: &ChatRow<'_>) -> egui::Response {
    let desired = egui::vec2(ui.available_width(), ROW_HEIGHT);
    let (rect, response) = ui.allocate_exact_size(desired, egui::Sense::click());
    if response.hovered() {
        ui.painter()
            .rect_filled(rect, egui::CornerRadius::same(6), theme::CARD_HOVER);
    }

    let other = &row.chat.other_user;
    ui.scope_builder(
        egui::UiBuilder::new().max_rect(rect.shrink2(egui::vec2(8.0, 6.0))),
        |ui| {
            ui.horizontal(|ui| {
                avatar::render(ui, &other.name, &other.avatar, 40.0);
                ui.vertical(|ui| {
                    ui.horizontal(|ui| {
                        ui.label(egui::RichText::new(&other.name).strong());
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if let Some(badge) = &row.badge {
                                egui::Frame::new()
                                    .fill(theme::BADGE_BG)
                                    .corner_radius(egui::CornerRadius::same(9))
                                    .inner_margin(egui::Margin::symmetric(6, 1))
                                    .show(ui, |ui| {
                                        ui.label(
                                            egui::RichText::new(badge)
                                                .small()
                                                .color(egui::Color32::WHITE),
                                        );
                                    });
                            }
                            ui.colored_label(theme::TEXT_SECONDARY, &row.activity);
                        });
                    });
                    ui.add(
                        egui::Label::new(
                            egui::RichText::new(row.preview).color(theme::TEXT_SECONDARY),
                        )
                        .truncate(),
                    );
                });
            });
        },
    );

    ui.separator();
    response
}
