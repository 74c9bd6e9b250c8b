use crate::config::config::AppConfig;
use crate::error::BoardError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the default path
    ///
    /// Sources, later ones win:
    /// 1. built-in landscape preset
    /// 2. ./board.toml
    /// 3. `SLOTBOARD_` environment variables, `__` separating sections
    pub fn load() -> Result<AppConfig, figment::Error> {
        Self::load_from(default_config_path())
    }

    /// Load configuration from the given path
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig, figment::Error> {
        Self::load_over(AppConfig::default(), path)
    }

    /// Load configuration on top of a preset instead of the landscape default
    pub fn load_over(preset: AppConfig, path: impl AsRef<Path>) -> Result<AppConfig, figment::Error> {
        Figment::from(Serialized::defaults(preset))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("SLOTBOARD_").split("__"))
            .extract()
    }

    /// Validate configuration values that do not depend on the roster
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.slots.count == 0 {
            return Err(ConfigValidationError::NoSlots);
        }

        if config.slots.default_capacity == 0 {
            return Err(ConfigValidationError::ZeroCapacity(None));
        }

        for o in &config.slots.overrides {
            if o.slot >= config.slots.count {
                return Err(ConfigValidationError::OverrideOutOfRange {
                    slot: o.slot,
                    count: config.slots.count,
                });
            }
            if o.capacity == Some(0) {
                return Err(ConfigValidationError::ZeroCapacity(Some(o.slot)));
            }
            if o.display_ms == Some(0) {
                return Err(ConfigValidationError::ZeroDuration("slots.overrides.display_ms"));
            }
        }

        if config.timing.display_ms == 0 {
            return Err(ConfigValidationError::ZeroDuration("timing.display_ms"));
        }

        if config.timing.transition_ms == 0 {
            return Err(ConfigValidationError::ZeroDuration("timing.transition_ms"));
        }

        if config.timing.wipe_ms > config.timing.transition_ms {
            return Err(ConfigValidationError::WipeExceedsTransition {
                wipe_ms: config.timing.wipe_ms,
                transition_ms: config.timing.transition_ms,
            });
        }

        if config.stagger.step == 0 {
            return Err(ConfigValidationError::ZeroStaggerStep);
        }

        if config.layout.rows == 0 {
            return Err(ConfigValidationError::NoRows);
        }

        if config.scroll.enabled {
            if !(config.scroll.speed > 0.0) {
                return Err(ConfigValidationError::InvalidScrollSpeed(config.scroll.speed));
            }
            if config.scroll.frame_ms == 0 {
                return Err(ConfigValidationError::ZeroDuration("scroll.frame_ms"));
            }
            if config.layout.copies < 2 {
                return Err(ConfigValidationError::TooFewCopies(config.layout.copies));
            }
        }

        Ok(())
    }
}

/// Configuration validation error
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigValidationError {
    #[error("slots.count must be greater than 0")]
    NoSlots,

    #[error("capacity must be greater than 0 (slot {0:?})")]
    ZeroCapacity(Option<usize>),

    #[error("override for slot {slot} is outside the {count} configured slots")]
    OverrideOutOfRange { slot: usize, count: usize },

    #[error("{0} must be greater than 0")]
    ZeroDuration(&'static str),

    #[error("wipe_ms ({wipe_ms}) exceeds transition_ms ({transition_ms})")]
    WipeExceedsTransition { wipe_ms: u64, transition_ms: u64 },

    #[error("stagger.step must be greater than 0")]
    ZeroStaggerStep,

    #[error("layout.rows must be greater than 0")]
    NoRows,

    #[error("scroll.speed must be positive, got {0}")]
    InvalidScrollSpeed(f64),

    #[error("seamless scrolling needs at least 2 board copies, got {0}")]
    TooFewCopies(usize),
}

impl From<ConfigValidationError> for BoardError {
    fn from(e: ConfigValidationError) -> Self {
        BoardError::Config(e.to_string())
    }
}

/// Default configuration file path
pub fn default_config_path() -> PathBuf {
    PathBuf::from("board.toml")
}
