use eframe::egui;

use super::avatar;
use crate::common::{Friend, HomeIntent};
use crate::ui::theme;

#[derive(Debug, PartialEq)]
pub struct ProfileCard<'a> {
    pub name: &'a str,
    pub handle: String,
    pub email: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub friend_count: usize,
}

pub fn card(friend: &Friend) -> ProfileCard<'_> {
    ProfileCard {
        name: &friend.name,
        handle: format!("@{}", friend.username),
        email: friend.email.as_deref().filter(|email| !email.is_empty()),
        bio: friend.bio.as_deref().filter(|bio| !bio.trim().is_empty()),
        friend_count: friend.friend_count(),
    }
}

/// Modal overlay for one friend's profile.
///
/// A click on the backdrop, the close button or Escape dismisses it; clicks
/// inside the panel never reach the backdrop.
pub fn render(ctx: &egui::Context, friend: &Friend) -> Option<HomeIntent> {
    let profile = card(friend);
    let modal = egui::Modal::new(egui::Id::new(("profile_popup", &friend.id))).show(ctx, |ui| {
        ui.set_width(280.0);
        let mut close = false;
        ui.horizontal(|ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
                close = ui.button("✖").on_hover_text("Close").clicked();
            });
        });

        ui.vertical_centered(|ui| {
            avatar::render(ui, profile.name, &friend.avatar, 72.0);
            ui.heading(profile.name);
            ui.colored_label(theme::TEXT_SECONDARY, &profile.handle);
            if let Some(email) = profile.email {
                ui.label(format!("✉ {email}"));
            }
        });

        if let Some(bio) = profile.bio {
            ui.separator();
            ui.label(bio);
        }

        ui.separator();
        ui.vertical_centered(|ui| {
            ui.label(egui::RichText::new(profile.friend_count.to_string()).strong().size(18.0));
            ui.colored_label(theme::TEXT_SECONDARY, "Friends");
        });
        close
    });

    if modal.inner || modal.should_close() {
        Some(HomeIntent::CloseProfile)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::components::test_support::{Harness, SCREEN, run_context};

    fn carol() -> Friend {
        Friend {
            id: "carol".to_string(),
            name: "Carol".to_string(),
            username: "carol".to_string(),
            avatar: "https://example.com/carol.png".to_string(),
            bio: Some("Likes climbing".to_string()),
            email: Some("carol@example.com".to_string()),
            friends: Some(vec!["alice".to_string(), "dave".to_string()]),
        }
    }

    #[test]
    fn card_shows_optional_fields() {
        let friend = carol();
        let profile = card(&friend);
        assert_eq!(profile.handle, "@carol");
        assert_eq!(profile.email, Some("carol@example.com"));
        assert_eq!(profile.bio, Some("Likes climbing"));
        assert_eq!(profile.friend_count, 2);
    }

    #[test]
    fn friend_count_defaults_to_zero() {
        let friend = Friend {
            friends: None,
            email: None,
            bio: None,
            ..carol()
        };
        let profile = card(&friend);
        assert_eq!(profile.friend_count, 0);
        assert_eq!(profile.email, None);
    }

    #[test]
    fn stays_open_without_input() {
        let friend = carol();
        assert_eq!(run_context(|ctx| render(ctx, &friend)), None);
    }

    #[test]
    fn backdrop_click_closes_and_panel_click_does_not() {
        let friend = carol();
        let mut harness = Harness::new();
        for _ in 0..2 {
            assert_eq!(harness.frame(Vec::new(), |ctx| render(ctx, &friend)), None);
        }

        assert_eq!(harness.click(SCREEN.center(), |ctx| render(ctx, &friend)), None);
        assert_eq!(
            harness.click(SCREEN.left_top() + egui::vec2(5.0, 5.0), |ctx| {
                render(ctx, &friend)
            }),
            Some(HomeIntent::CloseProfile)
        );
    }

    #[test]
    fn escape_closes() {
        let friend = carol();
        let mut harness = Harness::new();
        for _ in 0..2 {
            harness.frame(Vec::new(), |ctx| render(ctx, &friend));
        }
        assert_eq!(
            harness.press_key(egui::Key::Escape, |ctx| render(ctx, &friend)),
            Some(HomeIntent::CloseProfile)
        );
    }
}
