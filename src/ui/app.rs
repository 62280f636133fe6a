//! Main application UI

use std::time::{Duration, Instant};

use egui::{CentralPanel, Context, SidePanel, TopBottomPanel};
use tracing::{info, warn};

use super::components::StatusBadge;
use super::panels::{self, access::AccessAction, settings::SettingsAction};
use super::theme::{Icons, Theme};
use crate::core::{
    AccessHandoff, AccessRouter, ControllerEvent, LifecycleController, OperationKind, Settings,
    VmPhase,
};
use crate::persistence::SettingsFile;

const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

/// Active view/tab in the main panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    Dashboard,
    Access,
    History,
    Settings,
}

impl ActiveView {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Access => "VM Access",
            Self::History => "History",
            Self::Settings => "Settings",
        }
    }
}

/// Notification message
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    pub created_at: Instant,
}

impl Notification {
    pub fn new(message: impl Into<String>, level: NotificationLevel) -> Self {
        Self {
            message: message.into(),
            level,
            created_at: Instant::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Main application struct
pub struct VmDashboardApp {
    /// Lifecycle state and command dispatch
    controller: LifecycleController,
    /// Settings in effect, environment overrides included
    settings: Settings,
    /// Settings as last read from or written to disk
    stored_settings: Settings,
    /// Settings being edited in the settings view
    settings_draft: Settings,
    settings_store: SettingsFile,
    active_view: ActiveView,
    /// Last access hand-off, shown by the access view
    access: AccessHandoff,
    notifications: Vec<Notification>,
    first_frame: bool,
}

impl VmDashboardApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        controller: LifecycleController,
        settings: Settings,
        stored_settings: Settings,
        settings_store: SettingsFile,
    ) -> Self {
        Theme::apply(&cc.egui_ctx, settings.theme);
        Self::with_controller(controller, settings, stored_settings, settings_store)
    }

    /// Build the app state and start the initial status query
    fn with_controller(
        mut controller: LifecycleController,
        settings: Settings,
        stored_settings: Settings,
        settings_store: SettingsFile,
    ) -> Self {
        controller.mount();

        Self {
            controller,
            settings_draft: stored_settings.clone(),
            stored_settings,
            settings,
            settings_store,
            active_view: ActiveView::Dashboard,
            access: AccessHandoff::default(),
            notifications: Vec::new(),
            first_frame: true,
        }
    }

    pub fn notify(&mut self, message: impl Into<String>, level: NotificationLevel) {
        self.notifications.push(Notification::new(message, level));
    }

    /// Drain finished operations and react to their outcome
    fn handle_events(&mut self) {
        for event in self.controller.poll() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::StatusResolved { phase } => {
                info!("VM status resolved: {}", phase);
                // The access view must never outlive the endpoint it shows
                self.access = AccessRouter::hand_off(self.controller.snapshot().access_endpoint());
                if phase != VmPhase::Running {
                    self.leave_access_view();
                }
            }
            ControllerEvent::Started { handoff } => {
                self.notify(
                    "VM Started: virtual machine is now running",
                    NotificationLevel::Success,
                );
                if let Some(handoff) = handoff {
                    self.access = handoff;
                    self.active_view = ActiveView::Access;
                }
            }
            ControllerEvent::Stopped => {
                self.notify(
                    "VM Stopped: virtual machine has been stopped",
                    NotificationLevel::Info,
                );
                self.access = AccessHandoff::default();
                self.leave_access_view();
            }
            ControllerEvent::CommandFailed { action, message } => {
                warn!("{} command failed: {}", action, message);
                self.notify(message, NotificationLevel::Error);
            }
        }
    }

    fn leave_access_view(&mut self) {
        if self.active_view == ActiveView::Access {
            self.active_view = ActiveView::Dashboard;
        }
    }

    /// An outstanding request or a toast still waiting to expire
    fn needs_periodic_repaint(&self) -> bool {
        self.controller.is_busy() || !self.notifications.is_empty()
    }

    fn cleanup_notifications(&mut self) {
        self.notifications
            .retain(|n| n.created_at.elapsed() < NOTIFICATION_TTL);
    }

    /// Switch views; entering the access view re-derives the hand-off from current state
    fn navigate(&mut self, view: ActiveView) {
        if view == ActiveView::Access {
            self.access = AccessRouter::hand_off(self.controller.snapshot().access_endpoint());
        }
        if view == ActiveView::Settings && self.active_view != ActiveView::Settings {
            self.settings_draft = self.stored_settings.clone();
        }
        self.active_view = view;
    }

    /// Apply saved settings that can change without rebuilding the controller
    fn apply_saved_settings(&mut self, ctx: &Context) {
        let saved = self.settings_draft.clone();
        if saved.theme != self.settings.theme {
            Theme::apply(ctx, saved.theme);
        }
        self.stored_settings = saved.clone();
        self.settings.theme = saved.theme;
        self.settings.show_metrics = saved.show_metrics;
        self.settings.instance_label = saved.instance_label;
        self.settings.debug_logging = saved.debug_logging;
    }

    fn render_sidebar(&mut self, ctx: &Context) {
        let mut clicked_view = None;

        SidePanel::left("sidebar")
            .resizable(false)
            .default_width(220.0)
            .frame(
                egui::Frame::none()
                    .fill(Theme::BG_SECONDARY)
                    .stroke(egui::Stroke::new(1.0, Theme::BORDER_LIGHT)),
            )
            .show(ctx, |ui| {
                ui.add_space(20.0);

                ui.horizontal(|ui| {
                    ui.add_space(16.0);
                    ui.label(egui::RichText::new("◈").size(24.0).color(Theme::PRIMARY));
                    ui.add_space(8.0);
                    ui.label(
                        egui::RichText::new(crate::APP_NAME)
                            .size(18.0)
                            .strong()
                            .color(Theme::TEXT_PRIMARY),
                    );
                });

                ui.add_space(24.0);

                let views = [
                    (ActiveView::Dashboard, "◉"),
                    (ActiveView::Access, Icons::LINK),
                    (ActiveView::History, Icons::HISTORY),
                    (ActiveView::Settings, Icons::SETTINGS),
                ];

                for (view, icon) in views {
                    let selected = self.active_view == view;
                    let bg_color = if selected {
                        Theme::PRIMARY.linear_multiply(0.15)
                    } else {
                        egui::Color32::TRANSPARENT
                    };
                    let text_color = if selected {
                        Theme::PRIMARY_LIGHT
                    } else {
                        Theme::TEXT_SECONDARY
                    };

                    let response = egui::Frame::none()
                        .fill(bg_color)
                        .rounding(egui::Rounding::same(8.0))
                        .inner_margin(egui::Margin::symmetric(16.0, 12.0))
                        .show(ui, |ui| {
                            ui.set_width(ui.available_width() - 16.0);
                            ui.horizontal(|ui| {
                                if selected {
                                    let (rect, _) = ui.allocate_exact_size(
                                        egui::vec2(3.0, 18.0),
                                        egui::Sense::hover(),
                                    );
                                    ui.painter().rect_filled(
                                        rect,
                                        egui::Rounding::same(2.0),
                                        Theme::PRIMARY,
                                    );
                                    ui.add_space(8.0);
                                }
                                ui.label(egui::RichText::new(icon).size(16.0).color(text_color));
                                ui.add_space(12.0);
                                ui.label(
                                    egui::RichText::new(view.label())
                                        .size(14.0)
                                        .color(text_color),
                                );
                            });
                        })
                        .response
                        .interact(egui::Sense::click());

                    if response.clicked() {
                        clicked_view = Some(view);
                    }
                    if response.hovered() && !selected {
                        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                    }
                    ui.add_space(2.0);
                }

                ui.add_space(20.0);

                ui.horizontal(|ui| {
                    ui.add_space(16.0);
                    let (rect, _) = ui.allocate_exact_size(
                        egui::vec2(ui.available_width() - 32.0, 1.0),
                        egui::Sense::hover(),
                    );
                    ui.painter().rect_filled(rect, 0.0, Theme::BORDER_LIGHT);
                });

                ui.add_space(16.0);

                ui.horizontal(|ui| {
                    ui.add_space(16.0);
                    ui.label(egui::RichText::new("VM STATUS").small().color(Theme::TEXT_MUTED));
                });
                ui.add_space(12.0);

                let phase = self.controller.snapshot().phase();
                egui::Frame::none()
                    .fill(Theme::BG_TERTIARY.linear_multiply(0.5))
                    .rounding(egui::Rounding::same(8.0))
                    .inner_margin(egui::Margin::same(12.0))
                    .outer_margin(egui::Margin::symmetric(16.0, 0.0))
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            StatusBadge::dot(ui, phase);
                            ui.label(
                                egui::RichText::new(phase.label())
                                    .size(14.0)
                                    .strong()
                                    .color(Theme::phase_color(phase)),
                            );
                        });
                        ui.label(
                            egui::RichText::new(&self.settings.api_base_url)
                                .small()
                                .monospace()
                                .color(Theme::TEXT_MUTED),
                        );
                    });

                ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
                    ui.add_space(16.0);
                    ui.horizontal(|ui| {
                        ui.add_space(16.0);
                        ui.label(
                            egui::RichText::new(format!("v{}", crate::APP_VERSION))
                                .small()
                                .color(Theme::TEXT_MUTED),
                        );
                    });
                    ui.add_space(8.0);
                });
            });

        if let Some(view) = clicked_view {
            self.navigate(view);
        }
    }

    fn render_top_bar(&mut self, ctx: &Context) {
        TopBottomPanel::top("top_bar")
            .frame(
                egui::Frame::none()
                    .fill(Theme::BG_PRIMARY)
                    .stroke(egui::Stroke::new(1.0, Theme::BORDER_LIGHT))
                    .inner_margin(egui::Margin::symmetric(20.0, 12.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(self.active_view.label())
                            .size(24.0)
                            .strong()
                            .color(Theme::TEXT_PRIMARY),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let refresh_btn = egui::Button::new(
                            egui::RichText::new(format!("{} Refresh", Icons::REFRESH))
                                .color(Theme::TEXT_PRIMARY),
                        )
                        .fill(Theme::BG_TERTIARY)
                        .rounding(egui::Rounding::same(8.0))
                        .min_size(egui::vec2(100.0, 36.0));

                        let response = ui.add_enabled(!self.controller.is_busy(), refresh_btn);
                        if response.clicked() {
                            if let Err(e) = self.controller.refresh_status() {
                                warn!("Refresh ignored: {}", e);
                            }
                        }

                        if matches!(self.controller.in_flight(), Some(OperationKind::StatusQuery)) {
                            ui.add(egui::Spinner::new().color(Theme::INFO));
                        }
                    });
                });
            });
    }

    fn render_main_content(&mut self, ctx: &Context) {
        let mut next_view = None;
        let mut saved = false;

        CentralPanel::default().show(ctx, |ui| match self.active_view {
            ActiveView::Dashboard => {
                panels::dashboard::render(
                    ui,
                    &mut self.controller,
                    &self.settings,
                    &mut self.notifications,
                );
            }
            ActiveView::Access => {
                if panels::access::render(ui, &self.access, &mut self.notifications)
                    == AccessAction::BackToDashboard
                {
                    next_view = Some(ActiveView::Dashboard);
                }
            }
            ActiveView::History => {
                panels::history::render(ui, &mut self.controller);
            }
            ActiveView::Settings => {
                saved = panels::settings::render(
                    ui,
                    &mut self.settings_draft,
                    &self.settings,
                    &self.settings_store,
                    &mut self.notifications,
                ) == SettingsAction::Saved;
            }
        });

        if saved {
            self.apply_saved_settings(ctx);
        }
        if let Some(view) = next_view {
            self.navigate(view);
        }
    }

    fn render_notifications(&mut self, ctx: &Context) {
        if self.notifications.is_empty() {
            return;
        }

        egui::Area::new(egui::Id::new("notifications"))
            .fixed_pos(egui::pos2(ctx.screen_rect().width() - 360.0, 80.0))
            .show(ctx, |ui| {
                for notification in &self.notifications {
                    let (icon, accent) = match notification.level {
                        NotificationLevel::Info => ("ℹ", Theme::INFO),
                        NotificationLevel::Success => ("✓", Theme::SUCCESS),
                        NotificationLevel::Warning => ("⚠", Theme::WARNING),
                        NotificationLevel::Error => ("✕", Theme::ERROR),
                    };

                    egui::Frame::none()
                        .fill(Theme::BG_ELEVATED)
                        .rounding(egui::Rounding::same(10.0))
                        .stroke(egui::Stroke::new(1.0, accent.linear_multiply(0.5)))
                        .shadow(egui::Shadow {
                            offset: egui::vec2(0.0, 4.0),
                            blur: 12.0,
                            spread: 2.0,
                            color: egui::Color32::from_black_alpha(60),
                        })
                        .inner_margin(egui::Margin::same(16.0))
                        .show(ui, |ui| {
                            ui.set_width(320.0);
                            ui.horizontal(|ui| {
                                egui::Frame::none()
                                    .fill(accent.linear_multiply(0.2))
                                    .rounding(egui::Rounding::same(6.0))
                                    .inner_margin(egui::Margin::same(6.0))
                                    .show(ui, |ui| {
                                        ui.label(
                                            egui::RichText::new(icon).size(14.0).color(accent),
                                        );
                                    });
                                ui.add_space(12.0);
                                ui.label(
                                    egui::RichText::new(&notification.message)
                                        .size(13.0)
                                        .color(Theme::TEXT_PRIMARY),
                                );
                            });
                        });

                    ui.add_space(10.0);
                }
            });
    }
}

impl eframe::App for VmDashboardApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        if self.first_frame {
            self.first_frame = false;
            info!("First frame rendered");
        }

        self.handle_events();
        self.cleanup_notifications();

        // Completions arrive off the UI thread
        if self.needs_periodic_repaint() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        self.render_sidebar(ctx);
        self.render_top_bar(ctx);
        self.render_main_content(ctx);
        self.render_notifications(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(kind) = self.controller.in_flight() {
            warn!("Exiting with {:?} still outstanding", kind);
        }
        info!("Application exiting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tokio::runtime::Handle;

    use crate::core::api::{ApiError, ControlApi, RemoteState, StatusResponse, ToggleResponse};
    use crate::core::vm::VmAction;
    use crate::core::AccessPresentation;

    const SESSION_URL: &str = "https://vm.example/session";

    /// Reports queued power states and hands out [`SESSION_URL`] on start
    struct ScriptedBackend {
        states: Mutex<VecDeque<RemoteState>>,
    }

    impl ScriptedBackend {
        fn new(states: impl IntoIterator<Item = RemoteState>) -> Arc<Self> {
            Arc::new(Self {
                states: Mutex::new(states.into_iter().collect()),
            })
        }
    }

    #[async_trait]
    impl ControlApi for ScriptedBackend {
        async fn status(&self) -> Result<StatusResponse, ApiError> {
            let status = self
                .states
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(RemoteState::Stopped);
            let url = (status == RemoteState::Running).then(|| SESSION_URL.to_string());
            Ok(StatusResponse { status, url })
        }

        async fn toggle(&self, action: VmAction) -> Result<ToggleResponse, ApiError> {
            let url = (action == VmAction::Start).then(|| SESSION_URL.to_string());
            Ok(ToggleResponse { url })
        }
    }

    fn app_with(
        backend: Arc<ScriptedBackend>,
        stored: Settings,
        effective: Settings,
    ) -> VmDashboardApp {
        let controller =
            LifecycleController::new(backend, Handle::current(), Duration::from_secs(5));
        let store = SettingsFile::new(std::env::temp_dir().join("vmdash-app-test.json"));
        VmDashboardApp::with_controller(controller, effective, stored, store)
    }

    fn app(backend: Arc<ScriptedBackend>) -> VmDashboardApp {
        app_with(backend, Settings::default(), Settings::default())
    }

    async fn settle(app: &mut VmDashboardApp) {
        let event = app.controller.settle().await.expect("completion");
        app.handle_event(event);
    }

    async fn started_app(backend: Arc<ScriptedBackend>) -> VmDashboardApp {
        let mut app = app(backend);
        settle(&mut app).await;
        app.controller.toggle().expect("toggle");
        settle(&mut app).await;
        assert_eq!(app.active_view, ActiveView::Access);
        assert_eq!(app.access.presentation(), AccessPresentation::Ready(SESSION_URL));
        app
    }

    #[tokio::test]
    async fn refresh_reporting_stopped_closes_access_view() {
        let mut app = started_app(ScriptedBackend::new([
            RemoteState::Stopped,
            RemoteState::Stopped,
        ]))
        .await;

        app.controller.refresh_status().expect("refresh");
        settle(&mut app).await;

        assert_eq!(app.controller.snapshot().phase(), VmPhase::Stopped);
        assert_eq!(app.controller.snapshot().access_endpoint(), None);
        assert_eq!(app.active_view, ActiveView::Dashboard);
        assert_eq!(app.access.presentation(), AccessPresentation::Degraded);
    }

    #[tokio::test]
    async fn refresh_reporting_running_keeps_access_view() {
        let mut app = started_app(ScriptedBackend::new([
            RemoteState::Stopped,
            RemoteState::Running,
        ]))
        .await;

        app.controller.refresh_status().expect("refresh");
        settle(&mut app).await;

        assert_eq!(app.active_view, ActiveView::Access);
        assert_eq!(app.access.presentation(), AccessPresentation::Ready(SESSION_URL));
    }

    #[tokio::test]
    async fn stop_leaves_access_view() {
        let mut app = started_app(ScriptedBackend::new([RemoteState::Stopped])).await;

        app.controller.toggle().expect("stop");
        settle(&mut app).await;

        assert_eq!(app.active_view, ActiveView::Dashboard);
        assert_eq!(app.access.presentation(), AccessPresentation::Degraded);
    }

    #[tokio::test]
    async fn repaints_only_while_busy_or_showing_toasts() {
        let mut app = app(ScriptedBackend::new([RemoteState::Stopped]));
        assert!(app.needs_periodic_repaint());

        let event = app.controller.settle().await.expect("status");
        app.handle_event(event);
        assert!(!app.needs_periodic_repaint());

        app.notify("hello", NotificationLevel::Info);
        assert!(app.needs_periodic_repaint());
    }

    #[tokio::test]
    async fn settings_editor_starts_from_stored_values() {
        let stored = Settings::default();
        let mut effective = stored.clone();
        effective.apply_overrides(|key| {
            (key == crate::core::settings::ENV_API_URL).then(|| "http://override:9000".to_string())
        });
        let mut app = app_with(ScriptedBackend::new([RemoteState::Stopped]), stored.clone(), effective);

        app.navigate(ActiveView::Settings);

        assert_eq!(app.settings.api_base_url, "http://override:9000");
        assert_eq!(app.settings_draft, stored);
    }
}
