use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Input data configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Profile roster (JSON array)
    pub profiles_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            profiles_path: PathBuf::from("data-full.json"),
        }
    }
}

/// Per-slot override of capacity and display time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotOverride {
    /// Slot number
    pub slot: usize,
    /// Number of profiles rotating through the slot
    pub capacity: Option<usize>,
    /// Display time in milliseconds
    pub display_ms: Option<u64>,
}

impl SlotOverride {
    pub fn capacity(slot: usize, capacity: usize) -> Self {
        Self {
            slot,
            capacity: Some(capacity),
            display_ms: None,
        }
    }
}

/// Slot grid configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotsConfig {
    /// Number of logical slots
    pub count: usize,
    /// Capacity for slots without an override
    pub default_capacity: usize,
    /// Per-slot overrides
    pub overrides: Vec<SlotOverride>,
}

impl Default for SlotsConfig {
    fn default() -> Self {
        Self {
            count: 35,
            default_capacity: 3,
            overrides: vec![SlotOverride::capacity(0, 4)],
        }
    }
}

/// Cycle timing configuration (milliseconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Display time for slots without an override
    pub display_ms: u64,
    /// Full transition duration, out-phase plus in-phase
    pub transition_ms: u64,
    /// Out-phase duration; content is replaced when it ends
    pub wipe_ms: u64,
    /// Delay between start and the first launch wave
    pub opening_wait_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            display_ms: 12_000,
            transition_ms: 2_000,
            wipe_ms: 1_000,
            opening_wait_ms: 1_000,
        }
    }
}

/// How slots are launched at start
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LaunchMode {
    /// Waves of slots spread across the grid
    Staggered,
    /// Every slot in a single wave
    Simultaneous,
}

/// Stagger launcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StaggerConfig {
    pub mode: LaunchMode,
    /// Cursor step between waves
    pub step: usize,
    /// Partner slot offset launched with each wave, defaults to half the grid
    pub pair_offset: Option<usize>,
    /// Interval between waves in milliseconds
    pub interval_ms: u64,
}

impl Default for StaggerConfig {
    fn default() -> Self {
        Self {
            mode: LaunchMode::Staggered,
            step: 7,
            pair_offset: None,
            interval_ms: 2_000,
        }
    }
}

/// Continuous horizontal scroll configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub enabled: bool,
    /// Pixels per second
    pub speed: f64,
    /// Frame interval in milliseconds
    pub frame_ms: u64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            speed: 150.0,
            frame_ms: 16,
        }
    }
}

/// Board layout model used for width estimation and mirroring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Rows of contiguous slot numbers
    pub rows: usize,
    /// Rendered copies of the whole board (2 or more for seamless scrolling)
    pub copies: usize,
    /// Gap after each card in pixels
    pub gap: f64,
    /// Minimum text column width
    pub min_text_width: f64,
    /// Estimated width per message character
    pub glyph_width: f64,
    /// Image, gap and padding around the text column
    pub card_chrome: f64,
    /// Fixed cards appended to every row (slogan, logo)
    pub extra_cards: Vec<f64>,
    /// Number of underbar accents cycled by slot number
    pub accent_count: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rows: 7,
            copies: 2,
            gap: 80.0,
            min_text_width: 600.0,
            glyph_width: 32.0,
            card_chrome: 260.0,
            extra_cards: Vec::new(),
            accent_count: 3,
        }
    }
}

/// Image asset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Prefetch the next image during the display period
    pub prefetch: bool,
    /// Bound on a fallback load started at swap time
    pub timeout_ms: u64,
    /// Directory relative image references resolve against
    pub root: Option<PathBuf>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            prefetch: true,
            timeout_ms: 200,
            root: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter, overridden by RUST_LOG
    pub level: String,
    /// JSON formatted output
    pub structured: bool,
    /// Directory for daily rolling log files
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            structured: false,
            log_dir: None,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub slots: SlotsConfig,
    pub timing: TimingConfig,
    pub stagger: StaggerConfig,
    pub scroll: ScrollConfig,
    pub layout: LayoutConfig,
    pub assets: AssetsConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// 16:9 board: 35 slots in 7 rows, 106 profiles, uniform 12s display
    pub fn landscape() -> Self {
        Self::default()
    }

    /// 32:9 board: 25 slots in 5 rows, 106 profiles, display time tuned per slot
    ///
    /// Short display times pair with five profiles, longer ones with four.
    pub fn wide() -> Self {
        const DISPLAY_MS: [u64; 25] = [
            6_000, 7_600, 9_400, 8_200, 6_400, //
            7_800, 9_800, 6_800, 8_600, 10_400, //
            7_200, 9_600, 6_200, 8_800, 10_800, //
            8_000, 10_200, 7_000, 9_200, 6_600, //
            10_600, 8_400, 7_400, 9_000, 10_000,
        ];
        const FIVE_PROFILE_SLOTS: [usize; 6] = [0, 4, 7, 12, 17, 19];

        let overrides = DISPLAY_MS
            .iter()
            .enumerate()
            .map(|(slot, &display_ms)| SlotOverride {
                slot,
                capacity: FIVE_PROFILE_SLOTS.contains(&slot).then_some(5),
                display_ms: Some(display_ms),
            })
            .collect();

        let mut config = Self::default();
        config.slots = SlotsConfig {
            count: 25,
            default_capacity: 4,
            overrides,
        };
        config.timing.display_ms = 7_000;
        config.stagger.pair_offset = Some(12);
        config.layout.rows = 5;
        config
    }
}
