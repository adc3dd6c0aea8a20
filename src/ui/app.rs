use eframe::egui;

use super::home::Home;

pub struct ChatApp {
    home: Home,
}

impl ChatApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, home: Home) -> Self {
        Self { home }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.home.show(ctx);
    }
}
