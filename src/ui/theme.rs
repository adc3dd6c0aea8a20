use eframe::egui::Color32;

pub const ACCENT: Color32 = Color32::from_rgb(0x3B, 0x82, 0xF6);
pub const CARD_BG: Color32 = Color32::from_rgb(0x26, 0x2A, 0x33);
pub const CARD_HOVER: Color32 = Color32::from_rgb(0x31, 0x36, 0x42);
pub const CARD_STROKE: Color32 = Color32::from_rgb(0x3A, 0x40, 0x4D);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(0x9C, 0xA3, 0xAF);
pub const BADGE_BG: Color32 = Color32::from_rgb(0xEF, 0x44, 0x44);
pub const WARNING: Color32 = Color32::from_rgb(0xF5, 0x9E, 0x0B);
pub const BUBBLE_OWN: Color32 = Color32::from_rgb(0x25, 0x63, 0xEB);
pub const BUBBLE_OTHER: Color32 = Color32::from_rgb(0x37, 0x41, 0x51);

/// Background tints for initials badges, picked by name.
pub const AVATAR_TINTS: [Color32; 6] = [
    Color32::from_rgb(0x8B, 0x5C, 0xF6),
    Color32::from_rgb(0xEC, 0x48, 0x99),
    Color32::from_rgb(0x10, 0xB9, 0x81),
    Color32::from_rgb(0xF5, 0x9E, 0x0B),
    Color32::from_rgb(0x06, 0xB6, 0xD4),
    Color32::from_rgb(0x63, 0x66, 0xF1),
];
