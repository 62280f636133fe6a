//! VM Dashboard - Start, stop and reach a remote virtual machine
//!
//! A desktop client for a VM control service. It shows the lifecycle phase of
//! one virtual machine, toggles it between running and stopped, and hands the
//! access URL over to the access view once the VM is up.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod core;
mod persistence;
mod ui;

use std::sync::Arc;

use anyhow::{Context, Result};
use single_instance::SingleInstance;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::{HttpControlApi, LifecycleController, Settings};
use crate::persistence::SettingsFile;
use crate::ui::VmDashboardApp;

/// Application name constant
pub const APP_NAME: &str = "VM Dashboard";

/// Directory name under the per-user config dir
pub const APP_DIR_NAME: &str = "VmDashboard";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<()> {
    let store = SettingsFile::default_location()?;
    let (stored, load_error) = match store.load() {
        Ok(loaded) => (loaded.unwrap_or_default(), None),
        Err(e) => (Settings::default(), Some(e)),
    };
    // Overrides live only in the effective copy so saving never persists them
    let mut settings = stored.clone();
    settings.apply_overrides(|key| std::env::var(key).ok());
    settings.validate();

    init_logging(settings.debug_logging);

    info!("{} v{} starting...", APP_NAME, APP_VERSION);
    if let Some(e) = load_error {
        warn!("Using default settings: {:#}", e);
    }

    let instance = SingleInstance::new(APP_DIR_NAME)
        .map_err(|e| anyhow::anyhow!("Failed to create single instance lock: {}", e))?;
    if !instance.is_single() {
        error!("Another instance of {} is already running!", APP_NAME);
        eprintln!("{} is already running!", APP_NAME);
        return Ok(());
    }

    // Network calls run here; the UI thread only polls for completions
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("vmdash-io")
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let api = HttpControlApi::new(&settings.api_base_url, settings.request_timeout())
        .context("Failed to create control API client")?;
    info!("Control service at {}", api.base_url());

    let controller = LifecycleController::new(
        Arc::new(api),
        runtime.handle().clone(),
        settings.command_timeout(),
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([760.0, 520.0])
            .with_icon(load_app_icon()),
        ..Default::default()
    };

    info!("Starting GUI...");
    eframe::run_native(
        &format!("{} v{}", APP_NAME, APP_VERSION),
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(VmDashboardApp::new(
                cc, controller, settings, stored, store,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run application: {}", e))?;

    runtime.shutdown_timeout(std::time::Duration::from_secs(1));
    info!("{} shutting down", APP_NAME);
    Ok(())
}

/// Initialize the logging system
fn init_logging(debug: bool) {
    let default_filter = if debug {
        "vmdash=debug,eframe=warn,egui=warn,reqwest=info"
    } else {
        "vmdash=info,eframe=warn,egui=warn,reqwest=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Power-symbol style icon drawn at startup
fn load_app_icon() -> egui::IconData {
    let size = 64;
    let mut rgba = vec![0u8; size * size * 4];
    let radius = size as f32 / 2.0;

    for y in 0..size {
        for x in 0..size {
            let idx = (y * size + x) * 4;
            let cx = x as f32 - radius;
            let cy = y as f32 - radius;
            let dist = (cx * cx + cy * cy).sqrt();

            let ring = (dist - radius * 0.55).abs() < 4.0 && cy > -radius * 0.35;
            let stem = cx.abs() < 4.0 && cy < 0.0 && cy > -radius * 0.75;

            if dist < radius - 2.0 {
                let (r, g, b) = if ring || stem {
                    (250, 250, 255)
                } else {
                    let t = dist / radius;
                    ((99.0 - t * 30.0) as u8, (102.0 - t * 35.0) as u8, (241.0 - t * 60.0) as u8)
                };
                rgba[idx] = r;
                rgba[idx + 1] = g;
                rgba[idx + 2] = b;
                rgba[idx + 3] = 255;
            }
        }
    }

    egui::IconData {
        rgba,
        width: size as u32,
        height: size as u32,
    }
}
