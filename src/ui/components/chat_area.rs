use chrono::Local;
use eframe::egui;

use crate::common::ChatMessage;
use crate::ui::theme;

pub const EMPTY_TEXT: &str = "No messages yet. Say hi!";

/// Scrolling thread; own messages are aligned right and labelled "You".
pub fn render(ui: &mut egui::Ui, messages: &[ChatMessage], own_id: &str, friend_name: &str) {
    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            if messages.is_empty() {
                ui.colored_label(theme::TEXT_SECONDARY, EMPTY_TEXT);
                return;
            }

            for message in messages {
                let own = message.sender_id == own_id;
                let (align, fill, author) = if own {
                    (egui::Align::Max, theme::BUBBLE_OWN, "You")
                } else {
                    (egui::Align::Min, theme::BUBBLE_OTHER, friend_name)
                };

                ui.with_layout(egui::Layout::top_down(align), |ui| {
                    egui::Frame::new()
                        .fill(fill)
                        .corner_radius(egui::CornerRadius::same(10))
                        .inner_margin(egui::Margin::symmetric(10, 6))
                        .show(ui, |ui| {
                            ui.set_max_width(ui.available_width() * 0.7);
                            ui.label(egui::RichText::new(&message.content).color(egui::Color32::WHITE));
                            let time = message.timestamp.with_timezone(&Local).format("%H:%M");
                            ui.label(
                                egui::RichText::new(format!("{author} · {time}"))
                                    .small()
                                    .color(theme::TEXT_SECONDARY),
                            );
                        });
                });
                ui.add_space(4.0);
            }
        });
}
