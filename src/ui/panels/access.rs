//! Access panel - Presents the VM access endpoint handed over after a start

use egui::Ui;
use tracing::{error, info};

use crate::core::{AccessHandoff, AccessPresentation};
use crate::ui::app::{Notification, NotificationLevel};
use crate::ui::theme::{Icons, Theme};

/// Navigation requested by the access panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessAction {
    None,
    BackToDashboard,
}

pub fn render(
    ui: &mut Ui,
    handoff: &AccessHandoff,
    notifications: &mut Vec<Notification>,
) -> AccessAction {
    let mut action = AccessAction::None;

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            ui.add_space(8.0);

            let back = egui::Button::new(
                egui::RichText::new(format!("{} Back to Dashboard", Icons::BACK))
                    .color(Theme::TEXT_PRIMARY),
            )
            .fill(Theme::BG_TERTIARY)
            .rounding(egui::Rounding::same(8.0));
            if ui.add(back).clicked() {
                action = AccessAction::BackToDashboard;
            }

            ui.add_space(20.0);

            egui::Frame::none()
                .fill(Theme::BG_SECONDARY)
                .rounding(egui::Rounding::same(12.0))
                .stroke(egui::Stroke::new(1.0, Theme::BORDER_LIGHT))
                .inner_margin(egui::Margin::same(20.0))
                .show(ui, |ui| {
                    ui.set_max_width(720.0);
                    match handoff.presentation() {
                        AccessPresentation::Ready(endpoint) => {
                            render_endpoint(ui, endpoint, notifications)
                        }
                        AccessPresentation::Degraded => render_degraded(ui),
                    }
                });

            ui.add_space(20.0);
            render_next_steps(ui);
        });

    action
}

fn render_endpoint(ui: &mut Ui, endpoint: &str, notifications: &mut Vec<Notification>) {
    ui.label(
        egui::RichText::new("VM Successfully Started!")
            .size(18.0)
            .strong()
            .color(Theme::SUCCESS),
    );
    ui.label(
        egui::RichText::new("Your virtual machine is now running and ready to use")
            .size(12.0)
            .color(Theme::TEXT_MUTED),
    );
    ui.add_space(16.0);

    egui::Frame::none()
        .fill(Theme::SUCCESS.linear_multiply(0.1))
        .rounding(egui::Rounding::same(8.0))
        .stroke(egui::Stroke::new(1.0, Theme::SUCCESS.linear_multiply(0.4)))
        .inner_margin(egui::Margin::same(14.0))
        .show(ui, |ui| {
            ui.label(
                egui::RichText::new("VM Access URL:")
                    .size(13.0)
                    .strong()
                    .color(Theme::SUCCESS),
            );
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(endpoint).monospace().color(Theme::TEXT_PRIMARY));

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let open_btn = egui::Button::new(
                        egui::RichText::new(format!("{} Open VM", Icons::LINK))
                            .color(egui::Color32::WHITE),
                    )
                    .fill(Theme::PRIMARY)
                    .rounding(egui::Rounding::same(6.0));
                    if ui.add(open_btn).clicked() {
                        open_endpoint(endpoint, notifications);
                    }

                    if ui
                        .button(Icons::COPY)
                        .on_hover_text("Copy URL")
                        .clicked()
                    {
                        ui.output_mut(|o| o.copied_text = endpoint.to_string());
                        notifications.push(Notification::new(
                            "Access URL copied",
                            NotificationLevel::Info,
                        ));
                    }
                });
            });
        });

    ui.add_space(10.0);
    ui.label(
        egui::RichText::new("Use \"Open VM\" to reach your virtual machine in the browser.")
            .size(12.0)
            .color(Theme::TEXT_SECONDARY),
    );
}

fn open_endpoint(endpoint: &str, notifications: &mut Vec<Notification>) {
    info!("Opening VM endpoint {}", endpoint);
    if let Err(e) = open::that(endpoint) {
        error!("Failed to open {}: {}", endpoint, e);
        notifications.push(Notification::new(
            format!("Could not open browser: {}", e),
            NotificationLevel::Error,
        ));
    }
}

fn render_degraded(ui: &mut Ui) {
    ui.label(
        egui::RichText::new("Virtual Machine")
            .size(18.0)
            .strong()
            .color(Theme::TEXT_PRIMARY),
    );
    ui.add_space(12.0);

    egui::Frame::none()
        .fill(Theme::WARNING.linear_multiply(0.1))
        .rounding(egui::Rounding::same(8.0))
        .stroke(egui::Stroke::new(1.0, Theme::WARNING.linear_multiply(0.4)))
        .inner_margin(egui::Margin::same(14.0))
        .show(ui, |ui| {
            ui.label(
                egui::RichText::new(format!("{} No access endpoint provided", Icons::WARNING))
                    .strong()
                    .color(Theme::WARNING),
            );
            ui.label(
                egui::RichText::new(
                    "The VM may still be starting, or the control service did not report \
                     an access URL. Check the backend configuration.",
                )
                .size(12.0)
                .color(Theme::TEXT_SECONDARY),
            );
        });
}

fn render_next_steps(ui: &mut Ui) {
    egui::Frame::none()
        .fill(Theme::BG_SECONDARY)
        .rounding(egui::Rounding::same(12.0))
        .inner_margin(egui::Margin::same(20.0))
        .show(ui, |ui| {
            ui.set_max_width(720.0);
            ui.label(
                egui::RichText::new("Next Steps")
                    .size(16.0)
                    .strong()
                    .color(Theme::TEXT_PRIMARY),
            );
            ui.add_space(8.0);
            for step in [
                "Use the access URL above to connect to your VM",
                "Your VM session stays active until you stop it from the dashboard",
                "Stop the VM when you are done to save resources",
            ] {
                ui.label(
                    egui::RichText::new(format!("• {}", step))
                        .size(13.0)
                        .color(Theme::TEXT_SECONDARY),
                );
            }
        });
}
