//! Observability
//!
//! Board counters and structured logging setup.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::config::LoggingConfig;

// ===== Board Metrics (atomics, shared between the board task and observers) =====

/// Board counters
#[derive(Debug, Clone)]
pub struct BoardMetrics {
    pub swaps_total: Arc<AtomicU64>,
    pub swaps_skipped: Arc<AtomicU64>,
    pub degraded_swaps: Arc<AtomicU64>,
    pub asset_failures: Arc<AtomicU64>,
    pub waves_launched: Arc<AtomicU64>,
    pub slots_launched: Arc<AtomicU64>,
    pub scroll_wraps: Arc<AtomicU64>,
    pub start_time: DateTime<Utc>,
}

impl Default for BoardMetrics {
    fn default() -> Self {
        Self {
            swaps_total: Arc::default(),
            swaps_skipped: Arc::default(),
            degraded_swaps: Arc::default(),
            asset_failures: Arc::default(),
            waves_launched: Arc::default(),
            slots_launched: Arc::default(),
            scroll_wraps: Arc::default(),
            start_time: Utc::now(),
        }
    }
}

impl BoardMetrics {
    /// Record a completed swap
    pub fn record_swap(&self) {
        self.swaps_total.fetch_add(1, Ordering::SeqCst);
    }

    /// Record a swap skipped for missing content
    pub fn record_skip(&self) {
        self.swaps_skipped.fetch_add(1, Ordering::SeqCst);
    }

    /// Record a swap shown before its image loaded
    pub fn record_degraded(&self) {
        self.degraded_swaps.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_asset_failure(&self) {
        self.asset_failures.fetch_add(1, Ordering::SeqCst);
    }

    /// Record a released launch wave
    pub fn record_wave(&self, slots: usize) {
        self.waves_launched.fetch_add(1, Ordering::SeqCst);
        self.slots_launched
            .fetch_add(slots as u64, Ordering::SeqCst);
    }

    pub fn record_wrap(&self) {
        self.scroll_wraps.fetch_add(1, Ordering::SeqCst);
    }

    pub fn swaps(&self) -> u64 {
        self.swaps_total.load(Ordering::SeqCst)
    }

    pub fn skipped(&self) -> u64 {
        self.swaps_skipped.load(Ordering::SeqCst)
    }

    pub fn uptime_seconds(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }

    /// Render counters in Prometheus text format
    pub fn gather(&self) -> String {
        format!(
            r#"# HELP slotboard_swaps_total Completed content swaps
# TYPE slotboard_swaps_total counter
slotboard_swaps_total {}
# HELP slotboard_swaps_skipped_total Swaps skipped for missing content
# TYPE slotboard_swaps_skipped_total counter
slotboard_swaps_skipped_total {}
# HELP slotboard_degraded_swaps_total Swaps shown before the image loaded
# TYPE slotboard_degraded_swaps_total counter
slotboard_degraded_swaps_total {}
# HELP slotboard_asset_failures_total Failed or timed out image loads
# TYPE slotboard_asset_failures_total counter
slotboard_asset_failures_total {}
# HELP slotboard_waves_launched_total Released launch waves
# TYPE slotboard_waves_launched_total counter
slotboard_waves_launched_total {}
# HELP slotboard_slots_launched_total Launched slots
# TYPE slotboard_slots_launched_total counter
slotboard_slots_launched_total {}
# HELP slotboard_scroll_wraps_total Seamless scroll wraparounds
# TYPE slotboard_scroll_wraps_total counter
slotboard_scroll_wraps_total {}
# HELP slotboard_uptime_seconds Seconds since the board was created
# TYPE slotboard_uptime_seconds gauge
slotboard_uptime_seconds {}
"#,
            self.swaps_total.load(Ordering::SeqCst),
            self.swaps_skipped.load(Ordering::SeqCst),
            self.degraded_swaps.load(Ordering::SeqCst),
            self.asset_failures.load(Ordering::SeqCst),
            self.waves_launched.load(Ordering::SeqCst),
            self.slots_launched.load(Ordering::SeqCst),
            self.scroll_wraps.load(Ordering::SeqCst),
            self.uptime_seconds(),
        )
    }
}

// ===== Structured Logging =====

/// Initialize tracing
///
/// `RUST_LOG` overrides the configured level. When a log directory is set,
/// output also goes to a daily rolling file; keep the returned guard alive for
/// as long as logs should be flushed.
pub fn init_tracing(config: &LoggingConfig) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},slotboard={}", config.level, config.level)));

    let (file_writer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "slotboard.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if config.structured {
        registry
            .with(fmt::layer().json().with_target(true).with_line_number(true))
            .with(file_writer.map(|w| fmt::layer().json().with_ansi(false).with_writer(w)))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .with(file_writer.map(|w| fmt::layer().with_ansi(false).with_writer(w)))
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("tracing subscriber already installed: {e}");
    }

    guard
}
