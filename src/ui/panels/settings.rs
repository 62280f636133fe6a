//! Settings panel

use egui::{Color32, Ui, Vec2};
use tracing::error;

use crate::core::settings::Theme as SettingsTheme;
use crate::core::Settings;
use crate::persistence::SettingsFile;
use crate::ui::app::{Notification, NotificationLevel};
use crate::ui::theme::{Icons, Theme};

/// Outcome of a settings frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    None,
    /// The draft was validated and written to disk
    Saved,
}

/// Custom toggle switch widget
fn toggle_switch(ui: &mut Ui, on: &mut bool) -> egui::Response {
    let desired_size = Vec2::new(44.0, 24.0);
    let (rect, mut response) = ui.allocate_exact_size(desired_size, egui::Sense::click());

    if response.clicked() {
        *on = !*on;
        response.mark_changed();
    }

    if ui.is_rect_visible(rect) {
        let how_on = ui.ctx().animate_bool_responsive(response.id, *on);

        let track_color = if *on {
            Theme::SUCCESS.linear_multiply(0.9 + 0.1 * how_on)
        } else {
            Theme::BG_TERTIARY
        };
        ui.painter().rect(
            rect,
            egui::Rounding::same(12.0),
            track_color,
            egui::Stroke::new(1.0, if *on { Theme::SUCCESS } else { Theme::BORDER }),
        );

        let circle_x = egui::lerp((rect.left() + 12.0)..=(rect.right() - 12.0), how_on);
        let circle_center = egui::pos2(circle_x, rect.center().y);
        ui.painter().circle(
            circle_center + Vec2::new(0.0, 1.0),
            9.0,
            Color32::from_black_alpha(30),
            egui::Stroke::NONE,
        );
        ui.painter()
            .circle(circle_center, 9.0, Color32::WHITE, egui::Stroke::NONE);
    }

    response
}

fn section_header(ui: &mut Ui, icon: &str, title: &str) {
    ui.add_space(8.0);
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(icon).size(20.0).color(Theme::PRIMARY_LIGHT));
        ui.add_space(8.0);
        ui.label(
            egui::RichText::new(title)
                .size(17.0)
                .strong()
                .color(Theme::TEXT_PRIMARY),
        );
    });
    ui.add_space(12.0);
}

fn setting_row(ui: &mut Ui, label: &str, description: &str, add_widget: impl FnOnce(&mut Ui)) {
    ui.horizontal(|ui| {
        ui.vertical(|ui| {
            ui.add_space(2.0);
            ui.label(egui::RichText::new(label).size(14.0).color(Theme::TEXT_PRIMARY));
            ui.label(
                egui::RichText::new(description)
                    .size(12.0)
                    .color(Theme::TEXT_SECONDARY),
            );
        });
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            add_widget(ui);
        });
    });
    ui.add_space(14.0);
}

fn toggle_setting(ui: &mut Ui, value: &mut bool, label: &str, description: &str) {
    setting_row(ui, label, description, |ui| {
        toggle_switch(ui, value);
    });
}

fn section_frame(ui: &mut Ui, add_contents: impl FnOnce(&mut Ui)) {
    egui::Frame::none()
        .fill(Theme::BG_SECONDARY)
        .rounding(egui::Rounding::same(12.0))
        .stroke(egui::Stroke::new(1.0, Theme::BORDER_LIGHT))
        .inner_margin(egui::Margin::same(20.0))
        .outer_margin(egui::Margin::symmetric(0.0, 4.0))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            add_contents(ui);
        });
}

/// Render the settings editor over `draft`. `active` is what the running
/// controller was built with, used to flag fields that need a restart.
pub fn render(
    ui: &mut Ui,
    draft: &mut Settings,
    active: &Settings,
    store: &SettingsFile,
    notifications: &mut Vec<Notification>,
) -> SettingsAction {
    let mut action = SettingsAction::None;

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            ui.set_max_width(680.0);
            ui.add_space(12.0);
            ui.label(
                egui::RichText::new("Configure the control service and dashboard preferences")
                    .size(14.0)
                    .color(Theme::TEXT_SECONDARY),
            );
            ui.add_space(16.0);

            section_header(ui, Icons::SERVER, "Control Service");
            section_frame(ui, |ui| {
                setting_row(ui, "API base URL", "Where /api/vm/* is served", |ui| {
                    ui.add(
                        egui::TextEdit::singleline(&mut draft.api_base_url)
                            .hint_text("http://127.0.0.1:5000")
                            .desired_width(260.0),
                    );
                });

                setting_row(ui, "Request timeout", "Per HTTP request", |ui| {
                    ui.add(
                        egui::DragValue::new(&mut draft.request_timeout_ms)
                            .range(250..=120_000)
                            .suffix(" ms")
                            .speed(50.0),
                    );
                });

                setting_row(
                    ui,
                    "Command timeout",
                    "Longest a status check or start/stop may stay pending",
                    |ui| {
                        ui.add(
                            egui::DragValue::new(&mut draft.command_timeout_secs)
                                .range(1..=600)
                                .suffix(" sec")
                                .speed(1.0),
                        );
                    },
                );

                if needs_restart(draft, active) {
                    ui.label(
                        egui::RichText::new(format!(
                            "{} Connection changes take effect after restarting the app",
                            Icons::WARNING
                        ))
                        .size(12.0)
                        .color(Theme::WARNING),
                    );
                }
            });

            ui.add_space(20.0);

            section_header(ui, "\u{1F3A8}", "Appearance");
            section_frame(ui, |ui| {
                setting_row(ui, "Theme", "Choose your preferred color scheme", |ui| {
                    for theme in SettingsTheme::all().iter().rev() {
                        ui.radio_value(&mut draft.theme, *theme, theme.label());
                    }
                });

                toggle_setting(
                    ui,
                    &mut draft.show_metrics,
                    "Show overview cards",
                    "Display CPU, memory and uptime cards on the dashboard",
                );

                setting_row(ui, "Instance ID", "Label shown on the control card", |ui| {
                    ui.add(
                        egui::TextEdit::singleline(&mut draft.instance_label).desired_width(160.0),
                    );
                });
            });

            ui.add_space(20.0);

            section_header(ui, "\u{1F527}", "Advanced");
            section_frame(ui, |ui| {
                toggle_setting(
                    ui,
                    &mut draft.debug_logging,
                    "Debug logging",
                    "Enable verbose logging for troubleshooting (next launch)",
                );

                let location = store.path().to_string_lossy().to_string();
                setting_row(ui, "Settings file", &location, |ui| {
                    let btn = egui::Button::new("Open Folder")
                        .fill(Theme::BG_TERTIARY)
                        .rounding(egui::Rounding::same(6.0))
                        .min_size(egui::vec2(100.0, 28.0));
                    if ui.add(btn).clicked() {
                        if let Some(dir) = store.path().parent() {
                            if let Err(e) = open::that(dir) {
                                error!("Failed to open {}: {}", dir.display(), e);
                            }
                        }
                    }
                });
            });

            ui.add_space(32.0);

            ui.horizontal(|ui| {
                let save_btn = egui::Button::new(
                    egui::RichText::new("Save Settings").color(Color32::WHITE),
                )
                .fill(Theme::PRIMARY)
                .rounding(egui::Rounding::same(8.0))
                .min_size(egui::vec2(140.0, 40.0));

                if ui.add(save_btn).clicked() {
                    draft.validate();
                    match store.save(draft) {
                        Ok(()) => {
                            notifications.push(Notification::new(
                                "Settings saved",
                                NotificationLevel::Success,
                            ));
                            action = SettingsAction::Saved;
                        }
                        Err(e) => {
                            error!("Failed to save settings: {:#}", e);
                            notifications.push(Notification::new(
                                format!("Failed to save settings: {}", e),
                                NotificationLevel::Error,
                            ));
                        }
                    }
                }

                ui.add_space(12.0);

                let reset_btn = egui::Button::new("Reset to Defaults")
                    .fill(Theme::BG_TERTIARY)
                    .rounding(egui::Rounding::same(8.0))
                    .min_size(egui::vec2(140.0, 40.0));
                if ui.add(reset_btn).clicked() {
                    *draft = Settings::default();
                }
            });

            ui.add_space(32.0);

            egui::Frame::none()
                .fill(Theme::BG_TERTIARY.linear_multiply(0.4))
                .rounding(egui::Rounding::same(12.0))
                .inner_margin(egui::Margin::same(20.0))
                .show(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.label(
                            egui::RichText::new(format!(
                                "{} v{}",
                                crate::APP_NAME,
                                crate::APP_VERSION
                            ))
                            .size(15.0)
                            .strong()
                            .color(Theme::TEXT_PRIMARY),
                        );
                        ui.add_space(6.0);
                        ui.label(
                            egui::RichText::new("Start, stop and reach your virtual machine")
                                .size(13.0)
                                .color(Theme::TEXT_SECONDARY),
                        );
                    });
                });

            ui.add_space(24.0);
        });

    action
}

/// Whether `draft` differs from `active` in a field the controller captured at startup
fn needs_restart(draft: &Settings, active: &Settings) -> bool {
    draft.api_base_url.trim() != active.api_base_url
        || draft.request_timeout_ms != active.request_timeout_ms
        || draft.command_timeout_secs != active.command_timeout_secs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_changes_do_not_need_restart() {
        let active = Settings::default();
        let mut draft = active.clone();
        draft.theme = SettingsTheme::Light;
        draft.show_metrics = false;
        draft.instance_label = "vm-042".to_string();
        assert!(!needs_restart(&draft, &active));
    }

    #[test]
    fn connection_changes_need_restart() {
        let active = Settings::default();

        let mut draft = active.clone();
        draft.api_base_url = "http://vm-host:8080".to_string();
        assert!(needs_restart(&draft, &active));

        let mut draft = active.clone();
        draft.command_timeout_secs = 90;
        assert!(needs_restart(&draft, &active));
    }
}
