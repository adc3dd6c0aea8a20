use eframe::egui;

/// Returns the trimmed text when the user sends it; blank input is kept, not sent.
pub fn render(ui: &mut egui::Ui, input_text: &mut String, enabled: bool) -> Option<String> {
    let mut send = false;
    ui.add_enabled_ui(enabled, |ui| {
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(input_text)
                    .hint_text("Type a message")
                    .desired_width(ui.available_width() - 70.0),
            );
            if ui.button("Send").clicked() {
                send = true;
            }

            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                send = true;
                response.request_focus();
            }
        });
    });

    take_message(input_text, send)
}

fn take_message(input_text: &mut String, send: bool) -> Option<String> {
    if !send {
        return None;
    }
    let message = input_text.trim().to_string();
    if message.is_empty() {
        return None;
    }
    input_text.clear();
    Some(message)
}
