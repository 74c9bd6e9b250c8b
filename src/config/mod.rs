//! Configuration
//!
//! Loads board configuration from a TOML file with environment variable
//! overrides and resolves it into per-slot settings.

pub mod config;
pub mod loader;
pub mod settings;

pub use config::{AppConfig, LaunchMode, LayoutConfig, LoggingConfig, SlotOverride};
pub use loader::{ConfigLoader, ConfigValidationError};
pub use settings::{BoardSettings, ScrollSettings, StaggerSettings};
