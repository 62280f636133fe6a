//! Dashboard panel - VM control card and overview cards

use egui::{Color32, Ui};
use tracing::warn;

use crate::core::{LifecycleController, Settings, VmPhase, VmSnapshot};
use crate::ui::app::{Notification, NotificationLevel};
use crate::ui::components::StatusBadge;
use crate::ui::theme::{Icons, Theme};

pub fn render(
    ui: &mut Ui,
    controller: &mut LifecycleController,
    settings: &Settings,
    notifications: &mut Vec<Notification>,
) {
    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            ui.add_space(8.0);
            ui.label(
                egui::RichText::new("Manage your virtual machine")
                    .size(14.0)
                    .color(Theme::TEXT_SECONDARY),
            );
            ui.add_space(20.0);

            render_control_card(ui, controller, settings, notifications);

            if settings.show_metrics {
                ui.add_space(24.0);
                render_overview_cards(ui, controller.snapshot().phase());
            }

            ui.add_space(20.0);
        });
}

fn render_control_card(
    ui: &mut Ui,
    controller: &mut LifecycleController,
    settings: &Settings,
    notifications: &mut Vec<Notification>,
) {
    let snapshot = controller.snapshot().clone();
    let phase = snapshot.phase();
    let can_toggle = phase.is_quiescent() && !controller.is_busy();
    let mut toggle_clicked = false;

    egui::Frame::none()
        .fill(Theme::BG_SECONDARY)
        .rounding(egui::Rounding::same(12.0))
        .stroke(egui::Stroke::new(
            1.0,
            if phase.is_active() {
                Theme::phase_color(phase).linear_multiply(0.4)
            } else {
                Theme::BORDER_LIGHT
            },
        ))
        .inner_margin(egui::Margin::same(20.0))
        .show(ui, |ui| {
            ui.set_max_width(720.0);

            // Header: icon, title, badge
            ui.horizontal(|ui| {
                egui::Frame::none()
                    .fill(Theme::PRIMARY.linear_multiply(0.15))
                    .rounding(egui::Rounding::same(8.0))
                    .inner_margin(egui::Margin::same(8.0))
                    .show(ui, |ui| {
                        ui.label(
                            egui::RichText::new(Icons::SERVER)
                                .size(20.0)
                                .color(Theme::PRIMARY_LIGHT),
                        );
                    });
                ui.add_space(10.0);
                ui.vertical(|ui| {
                    ui.label(
                        egui::RichText::new("Virtual Machine")
                            .size(18.0)
                            .strong()
                            .color(Theme::TEXT_PRIMARY),
                    );
                    ui.label(
                        egui::RichText::new("Primary VM Instance")
                            .size(12.0)
                            .color(Theme::TEXT_MUTED),
                    );
                });
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    StatusBadge::show(ui, phase);
                });
            });

            ui.add_space(16.0);

            ui.horizontal(|ui| {
                render_details(ui, &snapshot, settings);

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let response = ui.add_enabled(can_toggle, toggle_button(phase));
                    if response.clicked() {
                        toggle_clicked = true;
                    }
                    if phase.is_in_flight() {
                        ui.add(egui::Spinner::new().color(Theme::phase_color(phase)));
                    }
                });
            });

            if let Some(error) = snapshot.last_error() {
                ui.add_space(12.0);
                egui::Frame::none()
                    .fill(Theme::ERROR.linear_multiply(0.12))
                    .rounding(egui::Rounding::same(6.0))
                    .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                    .show(ui, |ui| {
                        ui.label(
                            egui::RichText::new(format!("{} {}", Icons::WARNING, error))
                                .size(12.0)
                                .color(Theme::ERROR),
                        );
                    });
            }
        });

    if toggle_clicked {
        if let Err(e) = controller.toggle() {
            warn!("Toggle ignored: {}", e);
            notifications.push(Notification::new(e.to_string(), NotificationLevel::Warning));
        }
    }
}

fn render_details(ui: &mut Ui, snapshot: &VmSnapshot, settings: &Settings) {
    ui.vertical(|ui| {
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new("Status:")
                    .size(13.0)
                    .color(Theme::TEXT_SECONDARY),
            );
            ui.label(
                egui::RichText::new(snapshot.phase().label())
                    .size(13.0)
                    .strong()
                    .color(Theme::TEXT_PRIMARY),
            );
        });
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new("Instance ID:")
                    .size(13.0)
                    .color(Theme::TEXT_SECONDARY),
            );
            ui.label(
                egui::RichText::new(&settings.instance_label)
                    .monospace()
                    .size(12.0)
                    .background_color(Theme::BG_TERTIARY),
            );
        });
        if let Some(endpoint) = snapshot.access_endpoint() {
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new("Access:")
                        .size(13.0)
                        .color(Theme::TEXT_SECONDARY),
                );
                ui.label(
                    egui::RichText::new(endpoint)
                        .monospace()
                        .size(12.0)
                        .color(Theme::INFO),
                );
            });
        }
    });
}

fn toggle_button(phase: VmPhase) -> egui::Button<'static> {
    let (text, fill) = match phase {
        VmPhase::Running => (format!("{} Stop VM", Icons::STOP), Theme::ERROR),
        VmPhase::Stopped => (format!("{} Start VM", Icons::POWER), Theme::SUCCESS),
        VmPhase::Starting => ("Starting...".to_string(), Theme::WARNING),
        VmPhase::Stopping => ("Stopping...".to_string(), Theme::WARNING),
        VmPhase::Checking => ("Checking...".to_string(), Theme::BG_TERTIARY),
        VmPhase::Unknown => (format!("{} Start VM", Icons::POWER), Theme::BG_TERTIARY),
    };

    egui::Button::new(egui::RichText::new(text).size(15.0).color(Color32::WHITE))
        .fill(fill)
        .rounding(egui::Rounding::same(8.0))
        .min_size(egui::vec2(140.0, 44.0))
}

/// Overview cards. The figures are indicative only, not live telemetry.
fn render_overview_cards(ui: &mut Ui, phase: VmPhase) {
    let running = phase == VmPhase::Running;
    let cards = [
        (Icons::CPU, "CPU Usage", if running { "45%" } else { "0%" }, Theme::PRIMARY_LIGHT),
        (Icons::MEMORY, "Memory", if running { "2.1/4 GB" } else { "0/4 GB" }, Theme::SUCCESS),
        (Icons::CLOCK, "Uptime", if running { "2h 15m" } else { "0m" }, Theme::INFO),
    ];

    ui.horizontal_wrapped(|ui| {
        for (icon, title, value, accent) in cards {
            egui::Frame::none()
                .fill(Theme::BG_SECONDARY)
                .rounding(egui::Rounding::same(10.0))
                .stroke(egui::Stroke::new(1.0, Theme::BORDER_LIGHT))
                .inner_margin(egui::Margin::same(16.0))
                .show(ui, |ui| {
                    ui.set_width(200.0);
                    ui.horizontal(|ui| {
                        ui.label(egui::RichText::new(icon).size(18.0).color(accent));
                        ui.add_space(8.0);
                        ui.vertical(|ui| {
                            ui.label(
                                egui::RichText::new(title)
                                    .size(12.0)
                                    .color(Theme::TEXT_SECONDARY),
                            );
                            ui.label(
                                egui::RichText::new(value)
                                    .size(18.0)
                                    .strong()
                                    .color(Theme::TEXT_PRIMARY),
                            );
                        });
                    });
                });
            ui.add_space(12.0);
        }
    });
}
