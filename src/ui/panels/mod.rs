//! Main-area views

pub mod access;
pub mod dashboard;
pub mod history;
pub mod settings;
