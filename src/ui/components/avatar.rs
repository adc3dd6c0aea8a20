use eframe::egui;

use crate::ui::theme;

/// Up to two uppercase initials of a display name, `?` when there are none.
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();
    if letters.is_empty() {
        "?".to_string()
    } else {
        letters
    }
}

fn tint(name: &str) -> egui::Color32 {
    let sum = name.bytes().fold(0usize, |acc, byte| acc + byte as usize);
    theme::AVATAR_TINTS[sum % theme::AVATAR_TINTS.len()]
}

/// Circular initials badge. The avatar reference is shown on hover.
pub fn render(ui: &mut egui::Ui, name: &str, avatar: &str, diameter: f32) -> egui::Response {
    let (rect, response) =
        ui.allocate_exact_size(egui::vec2(diameter, diameter), egui::Sense::hover());
    let painter = ui.painter();
    painter.circle_filled(rect.center(), diameter / 2.0, tint(name));
    painter.text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        initials(name),
        egui::FontId::proportional(diameter * 0.4),
        egui::Color32::WHITE,
    );

    if avatar.is_empty() {
        response
    } else {
        response.on_hover_text(avatar)
    }
}
