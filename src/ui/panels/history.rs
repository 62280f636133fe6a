//! History panel - Lifecycle events from this session

use egui::Ui;

use crate::core::LifecycleController;
use crate::ui::theme::Theme;

pub fn render(ui: &mut Ui, controller: &mut LifecycleController) {
    ui.horizontal(|ui| {
        ui.label(
            egui::RichText::new("Recent Activity")
                .size(16.0)
                .strong()
                .color(Theme::TEXT_PRIMARY),
        );
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let clear_btn = egui::Button::new("Clear")
                .fill(Theme::BG_TERTIARY)
                .rounding(egui::Rounding::same(6.0));
            if ui
                .add_enabled(!controller.activity().is_empty(), clear_btn)
                .clicked()
            {
                controller.activity_mut().clear();
            }
        });
    });
    ui.add_space(8.0);

    egui::Frame::none()
        .fill(Theme::BG_SECONDARY)
        .rounding(egui::Rounding::same(8.0))
        .inner_margin(egui::Margin::same(16.0))
        .show(ui, |ui| {
            let activity = controller.activity();
            if activity.is_empty() {
                ui.vertical_centered(|ui| {
                    ui.label(egui::RichText::new("No history yet").color(Theme::TEXT_MUTED));
                    ui.label(
                        egui::RichText::new("Status checks and start/stop commands appear here")
                            .small()
                            .color(Theme::TEXT_MUTED),
                    );
                });
                return;
            }

            egui::ScrollArea::vertical()
                .auto_shrink([false, true])
                .show(ui, |ui| {
                    for entry in activity.iter() {
                        let color = Theme::activity_color(entry.kind);
                        egui::Frame::none()
                            .fill(Theme::BG_TERTIARY)
                            .rounding(egui::Rounding::same(4.0))
                            .inner_margin(egui::Margin::same(8.0))
                            .show(ui, |ui| {
                                ui.horizontal(|ui| {
                                    let (rect, _) = ui.allocate_exact_size(
                                        egui::vec2(8.0, 8.0),
                                        egui::Sense::hover(),
                                    );
                                    ui.painter().circle_filled(rect.center(), 4.0, color);
                                    ui.add_space(8.0);

                                    ui.label(
                                        egui::RichText::new(
                                            entry
                                                .at
                                                .with_timezone(&chrono::Local)
                                                .format("%H:%M:%S")
                                                .to_string(),
                                        )
                                        .monospace()
                                        .small()
                                        .color(Theme::TEXT_MUTED),
                                    );
                                    ui.add_space(8.0);
                                    ui.label(
                                        egui::RichText::new(entry.kind.label())
                                            .small()
                                            .strong()
                                            .color(color),
                                    );
                                    ui.add_space(8.0);
                                    let text_color = if entry.kind.is_problem() {
                                        Theme::TEXT_PRIMARY
                                    } else {
                                        Theme::TEXT_SECONDARY
                                    };
                                    ui.label(
                                        egui::RichText::new(&entry.message).color(text_color),
                                    );
                                });
                            });
                        ui.add_space(4.0);
                    }
                });
        });
}
