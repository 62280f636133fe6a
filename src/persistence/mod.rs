//! Persistence module - Settings storage

mod settings_file;

pub use settings_file::SettingsFile;
