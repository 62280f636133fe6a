//! Core module - VM lifecycle state machine, control API client, and settings

pub mod activity;
pub mod api;
mod controller;
pub mod router;
pub mod settings;
pub mod vm;

pub use api::HttpControlApi;
pub use controller::{ControllerEvent, LifecycleController, OperationKind};
pub use router::{AccessHandoff, AccessPresentation, AccessRouter};
pub use settings::Settings;
pub use vm::{VmPhase, VmSnapshot};
