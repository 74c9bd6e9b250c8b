//! Resolved board settings
//!
//! Flattens [`AppConfig`] into per-slot vectors and durations once, at
//! initialization. Nothing here changes while a board runs.

use std::time::Duration;

use crate::config::config::{AppConfig, LaunchMode, LayoutConfig};
use crate::config::loader::ConfigLoader;
use crate::error::Result;

/// Launch ramp settings
#[derive(Debug, Clone, PartialEq)]
pub struct StaggerSettings {
    pub mode: LaunchMode,
    pub step: usize,
    pub pair_offset: usize,
    pub interval: Duration,
}

/// Scroll driver settings
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollSettings {
    pub enabled: bool,
    /// Pixels per second
    pub speed: f64,
    pub frame: Duration,
}

/// Settings a board is built from
#[derive(Debug, Clone)]
pub struct BoardSettings {
    /// Profiles rotating through each slot, indexed by slot number
    pub capacities: Vec<usize>,
    /// Display time per slot, indexed by slot number
    pub display: Vec<Duration>,
    pub transition: Duration,
    pub wipe: Duration,
    pub opening_wait: Duration,
    pub stagger: StaggerSettings,
    pub scroll: ScrollSettings,
    pub layout: LayoutConfig,
    pub prefetch: bool,
    pub asset_timeout: Duration,
}

impl BoardSettings {
    /// Validate and resolve a configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        ConfigLoader::validate(config)?;

        let count = config.slots.count;
        let mut capacities = vec![config.slots.default_capacity; count];
        let mut display = vec![Duration::from_millis(config.timing.display_ms); count];

        for o in &config.slots.overrides {
            if let Some(capacity) = o.capacity {
                capacities[o.slot] = capacity;
            }
            if let Some(ms) = o.display_ms {
                display[o.slot] = Duration::from_millis(ms);
            }
        }

        Ok(Self {
            capacities,
            display,
            transition: Duration::from_millis(config.timing.transition_ms),
            wipe: Duration::from_millis(config.timing.wipe_ms),
            opening_wait: Duration::from_millis(config.timing.opening_wait_ms),
            stagger: StaggerSettings {
                mode: config.stagger.mode,
                step: config.stagger.step,
                pair_offset: config.stagger.pair_offset.unwrap_or(count.div_ceil(2)),
                interval: Duration::from_millis(config.stagger.interval_ms),
            },
            scroll: ScrollSettings {
                enabled: config.scroll.enabled,
                speed: config.scroll.speed,
                frame: Duration::from_millis(config.scroll.frame_ms),
            },
            layout: config.layout.clone(),
            prefetch: config.assets.prefetch,
            asset_timeout: Duration::from_millis(config.assets.timeout_ms),
        })
    }

    /// Uniform settings for `slot_count` slots of equal capacity and display time
    ///
    /// Scrolling is disabled and the launch ramp starts without an opening wait.
    pub fn uniform(slot_count: usize, capacity: usize, display: Duration) -> Self {
        let defaults = AppConfig::default();
        Self {
            capacities: vec![capacity; slot_count],
            display: vec![display; slot_count],
            transition: Duration::from_millis(defaults.timing.transition_ms),
            wipe: Duration::from_millis(defaults.timing.wipe_ms),
            opening_wait: Duration::ZERO,
            stagger: StaggerSettings {
                mode: defaults.stagger.mode,
                step: defaults.stagger.step,
                pair_offset: slot_count.div_ceil(2),
                interval: Duration::from_millis(defaults.stagger.interval_ms),
            },
            scroll: ScrollSettings {
                enabled: false,
                speed: defaults.scroll.speed,
                frame: Duration::from_millis(defaults.scroll.frame_ms),
            },
            layout: LayoutConfig {
                rows: 1,
                ..defaults.layout
            },
            prefetch: defaults.assets.prefetch,
            asset_timeout: Duration::from_millis(defaults.assets.timeout_ms),
        }
    }

    pub fn slot_count(&self) -> usize {
        self.capacities.len()
    }

    /// Display time of one slot
    pub fn display_for(&self, slot: usize) -> Duration {
        self.display[slot]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config::SlotOverride;

    #[test]
    fn test_resolve_landscape() {
        let settings = BoardSettings::from_config(&AppConfig::landscape()).unwrap();
        assert_eq!(settings.slot_count(), 35);
        assert_eq!(settings.capacities[0], 4);
        assert!(settings.capacities[1..].iter().all(|&c| c == 3));
        assert_eq!(settings.display_for(20), Duration::from_secs(12));
        assert_eq!(settings.stagger.pair_offset, 18);
    }

    #[test]
    fn test_resolve_per_slot_display() {
        let settings = BoardSettings::from_config(&AppConfig::wide()).unwrap();
        assert_eq!(settings.display_for(0), Duration::from_millis(6_000));
        assert_eq!(settings.display_for(14), Duration::from_millis(10_800));
        assert_eq!(settings.capacities[19], 5);
        assert_eq!(settings.stagger.pair_offset, 12);
    }

    #[test]
    fn test_display_override_without_capacity() {
        let mut config = AppConfig::landscape();
        config.slots.overrides.push(SlotOverride {
            slot: 3,
            capacity: None,
            display_ms: Some(4_000),
        });
        let settings = BoardSettings::from_config(&config).unwrap();
        assert_eq!(settings.capacities[3], 3);
        assert_eq!(settings.display_for(3), Duration::from_millis(4_000));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = AppConfig::landscape();
        config.slots.count = 0;
        assert!(BoardSettings::from_config(&config).is_err());
    }
}
