//! Board controller
//!
//! Owns all mutable board state and drives every slot's state machine from a
//! single timer wheel. The controller is synchronous: callers pass the current
//! instant, which keeps the cycle deterministic under test. The async driver
//! lives in [`crate::services::runtime`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::assets::{AssetOutcome, AssetRequest, LoadKind};
use crate::config::settings::BoardSettings;
use crate::error::{BoardError, Result};
use crate::models::profile::ProfilePool;
use crate::models::slot::{SlotPhase, SlotRuntimeState, SlotSpec, TransitionPhase};
use crate::observability::BoardMetrics;
use crate::render::{RenderIntent, Sink, content_width};
use crate::services::planner::plan_with_count;
use crate::services::scheduler::{TimerEvent, TimerKey, TimerWheel};
use crate::services::scroll::ScrollDriver;
use crate::services::stagger::{StaggerLauncher, StaggerPlan};

/// Mutable board state, owned by one controller
#[derive(Debug)]
pub struct BoardState {
    /// Cycle active flag, cleared only by [`Board::stop`]
    pub active: bool,
    pub slots: Vec<SlotRuntimeState>,
    /// Slots asked to stop individually
    pub halted: HashSet<usize>,
    /// Pool indices whose images finished loading
    pub loaded_assets: HashSet<usize>,
    /// Pool indices with a load in flight
    pub pending_assets: HashSet<usize>,
    /// Slots whose current transition failed to render
    pub render_failed: HashSet<usize>,
}

impl BoardState {
    fn new(slot_count: usize) -> Self {
        Self {
            active: false,
            slots: (0..slot_count).map(SlotRuntimeState::new).collect(),
            halted: HashSet::new(),
            loaded_assets: HashSet::new(),
            pending_assets: HashSet::new(),
            render_failed: HashSet::new(),
        }
    }
}

/// Point-in-time view of one slot
#[derive(Debug, Clone, Serialize)]
pub struct SlotSnapshot {
    pub slot: usize,
    pub phase: SlotPhase,
    pub position: usize,
    /// Pool index currently on screen
    pub displayed_index: usize,
    pub displayed_id: Option<i64>,
    pub swaps: u64,
}

/// Point-in-time view of the board
#[derive(Debug, Clone, Serialize)]
pub struct BoardSnapshot {
    pub board_id: Uuid,
    pub active: bool,
    pub scroll_offset: f64,
    pub waves_released: usize,
    pub taken_at: DateTime<Utc>,
    pub slots: Vec<SlotSnapshot>,
}

impl BoardSnapshot {
    /// Slots per phase: (stopped, waiting, transitioning)
    pub fn phase_counts(&self) -> (usize, usize, usize) {
        self.slots.iter().fold((0, 0, 0), |(s, w, t), slot| match slot.phase {
            SlotPhase::Stopped => (s + 1, w, t),
            SlotPhase::Waiting => (s, w + 1, t),
            SlotPhase::Transitioning { .. } => (s, w, t + 1),
        })
    }
}

/// Slot scheduling controller
pub struct Board {
    id: Uuid,
    settings: BoardSettings,
    pool: ProfilePool,
    specs: Vec<SlotSpec>,
    state: BoardState,
    sink: Arc<dyn Sink>,
    wheel: TimerWheel,
    launcher: StaggerLauncher,
    scroll: ScrollDriver,
    last_frame: Option<Instant>,
    track_assets: bool,
    asset_requests: Vec<AssetRequest>,
    metrics: BoardMetrics,
    started: bool,
}

impl Board {
    /// Plan the board and render every slot's first profile
    ///
    /// Fails when the capacities do not cover the pool exactly.
    pub fn new(settings: BoardSettings, pool: ProfilePool, sink: Arc<dyn Sink>) -> Result<Self> {
        let slot_count = settings.slot_count();
        if settings.display.len() != slot_count {
            return Err(BoardError::Config(format!(
                "{} display times for {} slots",
                settings.display.len(),
                slot_count
            )));
        }
        let specs = plan_with_count(pool.len(), slot_count, &settings.capacities)?;
        let plan = StaggerPlan::new(slot_count, &settings.stagger);

        let board = Self {
            id: Uuid::new_v4(),
            state: BoardState::new(slot_count),
            launcher: StaggerLauncher::new(plan),
            scroll: ScrollDriver::new(settings.scroll.speed),
            track_assets: settings.prefetch,
            settings,
            pool,
            specs,
            sink,
            wheel: TimerWheel::new(),
            last_frame: None,
            asset_requests: Vec::new(),
            metrics: BoardMetrics::default(),
            started: false,
        };

        for slot in 0..slot_count {
            board.render_initial(slot);
        }

        info!(
            board = %board.id,
            slots = slot_count,
            profiles = board.pool.len(),
            waves = board.launcher.plan().len(),
            "Board initialized"
        );
        Ok(board)
    }

    /// Share counters with an outside observer
    pub fn with_metrics(mut self, metrics: BoardMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Track image loads; when off, every swap counts as fully loaded
    pub fn set_asset_tracking(&mut self, enabled: bool) {
        self.track_assets = enabled;
        if !enabled {
            self.asset_requests.clear();
            self.state.pending_assets.clear();
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &BoardSettings {
        &self.settings
    }

    pub fn pool(&self) -> &ProfilePool {
        &self.pool
    }

    pub fn specs(&self) -> &[SlotSpec] {
        &self.specs
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn slot(&self, slot: usize) -> Option<&SlotRuntimeState> {
        self.state.slots.get(slot)
    }

    pub fn metrics(&self) -> &BoardMetrics {
        &self.metrics
    }

    pub fn launcher(&self) -> &StaggerLauncher {
        &self.launcher
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    /// No transition in flight
    pub fn is_idle(&self) -> bool {
        !self.state.slots.iter().any(SlotRuntimeState::is_transitioning)
    }

    /// Stopped and every in-flight transition has completed
    pub fn is_finished(&self) -> bool {
        self.started && !self.state.active && self.is_idle()
    }

    /// Whether the slot has a timer armed
    pub fn has_timer(&self, slot: usize) -> bool {
        self.wheel.is_armed(TimerKey::Slot(slot))
    }

    pub fn scroll_running(&self) -> bool {
        self.scroll.is_running()
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll.offset()
    }

    // ===== Lifecycle =====

    /// Activate the cycle; the first wave launches after the opening wait
    pub fn start(&mut self, now: Instant) {
        if self.started {
            warn!(board = %self.id, "Board already started, reload to restart");
            return;
        }
        self.started = true;
        self.state.active = true;

        if !self.launcher.is_done() {
            self.wheel
                .arm(now + self.settings.opening_wait, TimerEvent::LaunchWave);
        }

        if self.settings.scroll.enabled {
            self.scroll.start();
            self.last_frame = Some(now);
        }

        if self.track_assets {
            for slot in 0..self.specs.len() {
                let index = self.specs[slot].sequence.at(self.state.slots[slot].position);
                self.request_asset(slot, index, LoadKind::Prefetch);
            }
        }

        info!(
            board = %self.id,
            opening_wait_ms = self.settings.opening_wait.as_millis() as u64,
            scroll = self.settings.scroll.enabled,
            "Board cycle started"
        );
    }

    /// Clear the cycle flag
    ///
    /// Waiting slots stop at once, in-flight transitions run to completion and
    /// then arm nothing. Scrolling halts immediately.
    pub fn stop(&mut self) {
        if !self.state.active {
            return;
        }
        self.state.active = false;
        self.launcher.cancel();
        self.wheel.cancel(TimerKey::Launcher);
        self.scroll.stop();

        let mut in_flight = 0;
        for slot in 0..self.state.slots.len() {
            if self.state.slots[slot].is_transitioning() {
                in_flight += 1;
            } else {
                self.park(slot);
            }
        }

        info!(board = %self.id, in_flight, "Board cycle stopping");
    }

    /// Stop one slot; the rest of the board is unaffected
    pub fn halt_slot(&mut self, slot: usize) {
        if slot >= self.state.slots.len() {
            warn!(board = %self.id, slot, "Cannot halt unknown slot");
            return;
        }
        self.state.halted.insert(slot);
        if !self.state.slots[slot].is_transitioning() {
            self.park(slot);
        }
        debug!(board = %self.id, slot, "Slot halted");
    }

    // ===== Timer processing =====

    /// Earliest armed deadline
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.wheel.next_deadline()
    }

    /// Run every timer due at `now`, returns how many fired
    ///
    /// Follow-up timers are armed relative to the deadline that fired, not to
    /// `now`, so late processing never shifts a slot's cadence.
    pub fn fire_due(&mut self, now: Instant) -> usize {
        let mut fired = 0;
        while let Some((deadline, event)) = self.wheel.pop_due(now) {
            fired += 1;
            let result = match event {
                TimerEvent::LaunchWave => {
                    self.release_wave(deadline);
                    Ok(())
                }
                TimerEvent::DisplayElapsed(slot) => self.on_display_elapsed(slot, deadline),
                TimerEvent::WipeOutDone(slot) => self.on_wipe_out_done(slot, deadline),
                TimerEvent::TransitionDone(slot) => self.on_transition_done(slot, deadline),
            };
            if let Err(e) = result {
                warn!(board = %self.id, ?event, error = %e, "Timer handling failed");
            }
        }
        fired
    }

    /// Advance virtual time in `step` increments, firing timers and scroll ticks
    pub fn run_until(&mut self, now: Instant, until: Instant, step: std::time::Duration) {
        let mut t = now;
        while t < until {
            t = (t + step).min(until);
            self.fire_due(t);
            self.tick_scroll(t);
        }
    }

    fn release_wave(&mut self, at: Instant) {
        if !self.state.active {
            return;
        }
        let Some(wave) = self.launcher.release() else {
            return;
        };

        for &slot in &wave {
            if let Err(e) = self.state.slots[slot].launch() {
                warn!(board = %self.id, slot, error = %e, "Launch rejected");
                continue;
            }
            self.arm_wait(slot, at);
        }
        self.metrics.record_wave(wave.len());
        debug!(board = %self.id, wave = ?wave, released = self.launcher.released(), "Launch wave released");

        if self.launcher.is_done() {
            info!(board = %self.id, waves = self.launcher.released(), "All slots launched");
        } else {
            self.wheel
                .arm(at + self.launcher.interval(), TimerEvent::LaunchWave);
        }
    }

    // ===== Slot state machine =====

    /// Checkpoint before arming the wait timer
    fn arm_wait(&mut self, slot: usize, at: Instant) {
        if !self.may_continue(slot) {
            self.park(slot);
            debug!(board = %self.id, slot, "Cycle stopped, no wait armed");
            return;
        }

        let display = self.settings.display_for(slot);
        self.wheel.arm(at + display, TimerEvent::DisplayElapsed(slot));

        let state = &self.state.slots[slot];
        let spec = &self.specs[slot];
        let next = spec.sequence.at(state.next_position(spec.capacity()));
        self.request_asset(slot, next, LoadKind::Prefetch);
    }

    /// Waiting -> Transitioning, checkpoint before the transition starts
    fn on_display_elapsed(&mut self, slot: usize, at: Instant) -> Result<()> {
        if !self.may_continue(slot) {
            self.park(slot);
            return Ok(());
        }

        let capacity = self.specs[slot].capacity();
        let next_position = self.state.slots[slot].next_position(capacity);
        let next = self.specs[slot].sequence.at(next_position);

        if self.pool.get(next).is_none() {
            let e = BoardError::MissingContent { slot, index: next };
            warn!(board = %self.id, slot, error = %e, "Skipping swap");
            self.state.slots[slot].skip(capacity);
            self.metrics.record_skip();
            self.arm_wait(slot, at);
            return Ok(());
        }

        self.state.slots[slot].begin_transition(next)?;
        self.sink.phase(slot, TransitionPhase::Out);

        if self.track_assets && !self.state.loaded_assets.contains(&next) {
            self.request_asset(slot, next, LoadKind::Fallback);
        }

        self.wheel
            .arm(at + self.settings.wipe, TimerEvent::WipeOutDone(slot));
        Ok(())
    }

    /// Out-phase done: replace content across the mirror group
    fn on_wipe_out_done(&mut self, slot: usize, at: Instant) -> Result<()> {
        let next = self.state.slots[slot].enter_in_phase()?;
        let asset_ready = !self.track_assets || self.state.loaded_assets.contains(&next);

        match self.pool.get(next) {
            Some(profile) => {
                let intent = RenderIntent {
                    index: next,
                    profile,
                    accent: self.accent_of(slot),
                    asset_ready,
                };
                match self.sink.render(slot, &intent) {
                    Ok(()) => {
                        if !asset_ready {
                            self.metrics.record_degraded();
                            debug!(board = %self.id, slot, profile = next, "Image not ready, swapped without it");
                        }
                    }
                    Err(e) => {
                        self.state.render_failed.insert(slot);
                        self.metrics.record_skip();
                        warn!(board = %self.id, slot, profile = next, error = %e, "Render failed, swap skipped");
                    }
                }
            }
            None => {
                self.state.render_failed.insert(slot);
                self.metrics.record_skip();
                warn!(board = %self.id, slot, profile = next, "Profile vanished mid-transition, swap skipped");
            }
        }

        self.sink.phase(slot, TransitionPhase::In);
        let in_phase = self.settings.transition.saturating_sub(self.settings.wipe);
        self.wheel.arm(at + in_phase, TimerEvent::TransitionDone(slot));
        Ok(())
    }

    /// Transitioning -> Waiting, then the checkpoint in `arm_wait`
    ///
    /// A transition whose render failed still advances the slot but is counted
    /// as skipped, not as a swap.
    fn on_transition_done(&mut self, slot: usize, at: Instant) -> Result<()> {
        let capacity = self.specs[slot].capacity();
        if self.state.render_failed.remove(&slot) {
            self.state.slots[slot].complete_skipped(capacity)?;
        } else {
            self.state.slots[slot].complete(capacity)?;
            self.metrics.record_swap();
        }

        if slot == 0 {
            let state = &self.state.slots[slot];
            debug!(
                board = %self.id,
                slot,
                position = state.position,
                capacity,
                swaps = state.swaps,
                "Slot swap completed"
            );
        }

        self.arm_wait(slot, at);
        Ok(())
    }

    fn may_continue(&self, slot: usize) -> bool {
        self.state.active && !self.state.halted.contains(&slot)
    }

    /// Move a non-transitioning slot to Stopped and disarm its timer
    fn park(&mut self, slot: usize) {
        self.wheel.cancel(TimerKey::Slot(slot));
        self.state.slots[slot].stop();
    }

    fn accent_of(&self, slot: usize) -> usize {
        slot % self.settings.layout.accent_count.max(1)
    }

    fn render_initial(&self, slot: usize) {
        let index = self.specs[slot].sequence.at(0);
        let Some(profile) = self.pool.get(index) else {
            warn!(board = %self.id, slot, profile = index, "No profile for initial render");
            return;
        };
        let intent = RenderIntent {
            index,
            profile,
            accent: self.accent_of(slot),
            asset_ready: !self.track_assets,
        };
        if let Err(e) = self.sink.render(slot, &intent) {
            warn!(board = %self.id, slot, error = %e, "Initial render failed");
        }
    }

    // ===== Assets =====

    fn request_asset(&mut self, slot: usize, index: usize, kind: LoadKind) {
        if !self.track_assets
            || self.state.loaded_assets.contains(&index)
            || self.state.pending_assets.contains(&index)
        {
            return;
        }
        let Some(profile) = self.pool.get(index) else {
            return;
        };
        self.state.pending_assets.insert(index);
        self.asset_requests.push(AssetRequest {
            slot,
            index,
            reference: profile.profile_image.clone(),
            kind,
        });
    }

    /// Take the load requests queued since the last call
    pub fn drain_asset_requests(&mut self) -> Vec<AssetRequest> {
        std::mem::take(&mut self.asset_requests)
    }

    /// Record a finished load
    pub fn record_asset(&mut self, outcome: AssetOutcome) {
        self.state.pending_assets.remove(&outcome.index);
        match &outcome.error {
            None => {
                self.state.loaded_assets.insert(outcome.index);
            }
            Some(reason) => {
                self.metrics.record_asset_failure();
                warn!(
                    board = %self.id,
                    slot = outcome.slot,
                    profile = outcome.index,
                    kind = ?outcome.kind,
                    reason = %reason,
                    "Image load failed"
                );
            }
        }
    }

    // ===== Scroll =====

    /// Advance the scroll offset to `now`
    ///
    /// The content width is measured from the sink on every tick.
    pub fn tick_scroll(&mut self, now: Instant) {
        if !self.scroll.is_running() {
            return;
        }
        let elapsed = self
            .last_frame
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        self.last_frame = Some(now);

        let width = content_width(self.sink.as_ref(), self.specs.len(), &self.settings.layout);
        if self.scroll.advance(elapsed, width) {
            self.metrics.record_wrap();
            debug!(board = %self.id, width, "Scroll wrapped");
        }
        self.sink.scroll_to(self.scroll.offset());
    }

    // ===== Snapshot =====

    pub fn snapshot(&self) -> BoardSnapshot {
        let slots = self
            .state
            .slots
            .iter()
            .zip(&self.specs)
            .map(|(state, spec)| {
                let displayed_index = match state.phase {
                    SlotPhase::Transitioning {
                        next,
                        phase: TransitionPhase::In,
                    } => next,
                    _ => spec.sequence.at(state.position),
                };
                SlotSnapshot {
                    slot: state.slot,
                    phase: state.phase,
                    position: state.position,
                    displayed_index,
                    displayed_id: self.pool.get(displayed_index).map(|p| p.id),
                    swaps: state.swaps,
                }
            })
            .collect();

        BoardSnapshot {
            board_id: self.id,
            active: self.state.active,
            scroll_offset: self.scroll.offset(),
            waves_released: self.launcher.released(),
            taken_at: Utc::now(),
            slots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::ProfileRecord;
    use crate::render::MirrorBoard;
    use std::time::Duration;

    const STEP: Duration = Duration::from_millis(100);

    fn roster(n: usize) -> ProfilePool {
        ProfilePool::new(
            (0..n)
                .map(|i| {
                    ProfileRecord::new(
                        i as i64 + 1,
                        &format!("user{i}"),
                        &format!("message {i}"),
                        &format!("img/{i}.png"),
                    )
                })
                .collect(),
        )
    }

    fn settings(slots: usize, capacity: usize) -> BoardSettings {
        let mut settings = BoardSettings::uniform(slots, capacity, Duration::from_secs(12));
        settings.prefetch = false;
        settings
    }

    fn board(settings: BoardSettings) -> (Board, Arc<MirrorBoard>) {
        let slots = settings.slot_count();
        let pool = roster(settings.capacities.iter().sum());
        let sink = Arc::new(MirrorBoard::new(slots, &settings.layout));
        let board = Board::new(settings, pool, sink.clone()).unwrap();
        (board, sink)
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_capacity_mismatch_aborts_construction() {
        let settings = settings(3, 3);
        let sink = Arc::new(MirrorBoard::new(3, &settings.layout));
        let result = Board::new(settings, roster(10), sink);
        assert!(matches!(
            result,
            Err(BoardError::CapacityMismatch {
                assigned: 9,
                pool_size: 10
            })
        ));
    }

    #[test]
    fn test_initial_render_shows_first_profile() {
        let (board, sink) = board(settings(4, 3));
        for spec in board.specs() {
            let first = spec.sequence.at(0) as i64 + 1;
            assert_eq!(sink.displayed(spec.slot), Some(first));
            assert!(sink.is_consistent(spec.slot));
        }
        assert!(board.state().slots.iter().all(|s| s.phase == SlotPhase::Stopped));
    }

    #[test]
    fn test_every_slot_launched_exactly_once() {
        let (mut board, _) = board(settings(10, 3));
        let t0 = Instant::now();
        board.start(t0);

        let waves = board.launcher().plan().len();
        board.run_until(t0, t0 + secs(2.0 * waves as f64 + 1.0), STEP);

        assert!(board.launcher().is_done());
        assert!(board.state().slots.iter().all(|s| s.launched));
        assert_eq!(
            board.metrics().slots_launched.load(std::sync::atomic::Ordering::SeqCst),
            10
        );
    }

    #[test]
    fn test_slot_cycles_through_its_block() {
        let (mut board, sink) = board(settings(1, 3));
        let t0 = Instant::now();
        board.start(t0);
        board.fire_due(t0);
        assert_eq!(board.slot(0).unwrap().phase, SlotPhase::Waiting);

        // out-phase
        board.fire_due(t0 + secs(12.0));
        assert!(matches!(
            board.slot(0).unwrap().phase,
            SlotPhase::Transitioning {
                next: 1,
                phase: TransitionPhase::Out
            }
        ));
        assert_eq!(sink.displayed(0), Some(1));

        // content replaced at the midpoint
        board.fire_due(t0 + secs(13.0));
        assert_eq!(sink.displayed(0), Some(2));
        assert_eq!(board.slot(0).unwrap().position, 0);

        board.fire_due(t0 + secs(14.0));
        assert_eq!(board.slot(0).unwrap().position, 1);
        assert_eq!(board.slot(0).unwrap().phase, SlotPhase::Waiting);

        board.run_until(t0 + secs(14.0), t0 + secs(28.0), STEP);
        assert_eq!(board.slot(0).unwrap().position, 2);

        // position 2 of 3 wraps to the first profile
        board.run_until(t0 + secs(28.0), t0 + secs(42.0), STEP);
        assert_eq!(board.slot(0).unwrap().position, 0);
        assert_eq!(sink.displayed(0), Some(1));
        assert_eq!(board.slot(0).unwrap().swaps, 3);
    }

    #[test]
    fn test_mirror_groups_agree_after_swaps() {
        let mut settings = settings(6, 2);
        settings.layout.copies = 3;
        let (mut board, sink) = board(settings);
        let t0 = Instant::now();
        board.start(t0);
        board.run_until(t0, t0 + secs(90.0), STEP);

        let snapshot = board.snapshot();
        for slot in &snapshot.slots {
            assert!(sink.is_consistent(slot.slot));
            assert_eq!(sink.group(slot.slot).len(), 3);
            if slot.phase == SlotPhase::Waiting {
                assert_eq!(sink.displayed(slot.slot), slot.displayed_id);
            }
        }
        assert!(board.metrics().swaps() > 0);
    }

    #[test]
    fn test_stop_lets_in_flight_transition_finish() {
        let (mut board, _) = board(settings(4, 3));
        let t0 = Instant::now();
        board.start(t0);
        board.run_until(t0, t0 + secs(12.5), STEP);
        assert!(board.slot(0).unwrap().is_transitioning());

        board.stop();
        assert!(!board.is_active());
        assert!(board.slot(0).unwrap().is_transitioning());
        assert!(!board.is_finished());
        for slot in board.state().slots.iter().filter(|s| !s.is_transitioning()) {
            assert_eq!(slot.phase, SlotPhase::Stopped);
            assert!(!board.has_timer(slot.slot));
        }

        board.run_until(t0 + secs(12.5), t0 + secs(60.0), STEP);
        let slot0 = board.slot(0).unwrap();
        assert_eq!(slot0.phase, SlotPhase::Stopped);
        assert_eq!(slot0.swaps, 1);
        assert!(!board.has_timer(0));
        assert!(board.is_finished());
        assert!(board.next_deadline().is_none());
    }

    #[test]
    fn test_halted_slot_finishes_then_rests_while_others_continue() {
        let (mut board, _) = board(settings(10, 3));
        let t0 = Instant::now();
        board.start(t0);

        // first wave is slots 0 and 5
        board.run_until(t0, t0 + secs(12.5), STEP);
        assert!(board.slot(5).unwrap().is_transitioning());

        board.halt_slot(5);
        board.run_until(t0 + secs(12.5), t0 + secs(60.0), STEP);

        let slot5 = board.slot(5).unwrap();
        assert_eq!(slot5.swaps, 1);
        assert_eq!(slot5.phase, SlotPhase::Stopped);
        assert!(!board.has_timer(5));

        // slot 0 kept its 14s cadence: swaps at 14, 28, 42, 56
        assert_eq!(board.slot(0).unwrap().swaps, 4);
        assert!(board.is_active());
    }

    #[test]
    fn test_render_failure_is_local_to_one_slot() {
        let settings = settings(3, 2);
        let pool = roster(6);
        // the sink knows nothing about slot 2
        let sink = Arc::new(MirrorBoard::new(2, &settings.layout));
        let mut board = Board::new(settings, pool, sink.clone()).unwrap();
        let t0 = Instant::now();
        board.start(t0);
        board.run_until(t0, t0 + secs(60.0), STEP);

        // the failing slot keeps its cadence: transitions end at 14, 28, 42, 56
        let failing = board.slot(2).unwrap();
        assert_eq!(failing.skipped, 4);
        assert_eq!(failing.swaps, 0);
        assert_eq!(failing.phase, SlotPhase::Waiting);
        assert_eq!(board.slot(0).unwrap().swaps, 4);
        assert_eq!(board.slot(1).unwrap().swaps, 4);

        // failed renders are not counted as completed swaps
        assert_eq!(board.metrics().swaps(), 8);
        assert_eq!(board.metrics().skipped(), 4);
        assert!(sink.is_consistent(0));
        assert!(sink.is_consistent(1));
    }

    #[test]
    fn test_missing_content_skips_swap_and_keeps_cadence() {
        let (mut board, sink) = board(settings(2, 2));
        board.specs[1] = SlotSpec {
            slot: 1,
            sequence: crate::models::slot::SlotSequence::new(vec![2, 99]),
        };
        let t0 = Instant::now();
        board.start(t0);
        board.fire_due(t0);

        board.fire_due(t0 + secs(12.0));
        let slot1 = board.slot(1).unwrap();
        assert_eq!(slot1.phase, SlotPhase::Waiting);
        assert_eq!(slot1.position, 1);
        assert_eq!(slot1.skipped, 1);
        assert!(board.has_timer(1));
        assert_eq!(sink.displayed(1), Some(3));
        assert_eq!(board.metrics().skipped(), 1);

        // the next cycle lands on a valid profile again
        board.run_until(t0 + secs(12.0), t0 + secs(26.5), STEP);
        let slot1 = board.slot(1).unwrap();
        assert_eq!(slot1.position, 0);
        assert_eq!(slot1.swaps, 1);
        assert_eq!(sink.displayed(1), Some(3));
        assert_eq!(board.slot(0).unwrap().swaps, 1);
    }

    #[test]
    fn test_display_times_must_cover_every_slot() {
        let mut settings = settings(3, 2);
        settings.display.pop();
        let sink = Arc::new(MirrorBoard::new(3, &settings.layout));
        let result = Board::new(settings, roster(6), sink);
        assert!(matches!(result, Err(BoardError::Config(_))));
    }

    #[test]
    fn test_scroll_offset_follows_speed_modulo_width() {
        let mut settings = settings(2, 1);
        settings.scroll.enabled = true;
        settings.scroll.speed = 150.0;
        let (mut board, sink) = board(settings);

        // two short cards of 860px plus 80px gap each
        let width = 2.0 * (860.0 + 80.0);
        let t0 = Instant::now();
        board.start(t0);
        board.run_until(t0, t0 + secs(20.0), Duration::from_millis(16));

        let expected = (150.0 * 20.0) % width;
        let tolerance = 150.0 * 0.016;
        assert!((board.scroll_offset() - expected).abs() <= tolerance);
        assert_eq!(sink.scroll_offset(), board.scroll_offset());

        board.stop();
        let frozen = board.scroll_offset();
        board.tick_scroll(t0 + secs(25.0));
        assert_eq!(board.scroll_offset(), frozen);
    }

    #[test]
    fn test_prefetch_and_degraded_swap() {
        let mut settings = settings(1, 3);
        settings.prefetch = true;
        let (mut board, sink) = board(settings);
        let t0 = Instant::now();

        board.start(t0);
        board.fire_due(t0);
        let requests = board.drain_asset_requests();
        assert_eq!(
            requests.iter().map(|r| (r.index, r.kind)).collect::<Vec<_>>(),
            vec![(0, LoadKind::Prefetch), (1, LoadKind::Prefetch)]
        );

        board.record_asset(AssetOutcome {
            slot: 0,
            index: 1,
            kind: LoadKind::Prefetch,
            error: Some("404".into()),
        });
        board.record_asset(AssetOutcome {
            slot: 0,
            index: 0,
            kind: LoadKind::Prefetch,
            error: None,
        });

        // not loaded at swap time: one bounded fallback
        board.fire_due(t0 + secs(12.0));
        let requests = board.drain_asset_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].kind, LoadKind::Fallback);

        // swap proceeds without the image
        board.fire_due(t0 + secs(13.0));
        assert_eq!(sink.displayed(0), Some(2));
        assert!(!sink.group(0)[0].asset_ready);

        board.fire_due(t0 + secs(14.0));
        let requests = board.drain_asset_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].index, 2);
        board.record_asset(AssetOutcome {
            slot: 0,
            index: 2,
            kind: LoadKind::Prefetch,
            error: None,
        });

        board.run_until(t0 + secs(14.0), t0 + secs(28.0), STEP);
        assert!(sink.group(0)[0].asset_ready);

        let metrics = board.metrics();
        assert_eq!(metrics.degraded_swaps.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(metrics.asset_failures.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_requests_without_tracking() {
        let mut settings = settings(2, 2);
        settings.prefetch = true;
        let (mut board, sink) = board(settings);
        board.set_asset_tracking(false);

        let t0 = Instant::now();
        board.start(t0);
        board.run_until(t0, t0 + secs(20.0), STEP);

        assert!(board.drain_asset_requests().is_empty());
        assert!(sink.group(0).iter().all(|e| e.asset_ready));
    }

    #[test]
    fn test_snapshot_phase_counts() {
        let (mut board, _) = board(settings(4, 3));
        let t0 = Instant::now();
        assert_eq!(board.snapshot().phase_counts(), (4, 0, 0));

        board.start(t0);
        board.run_until(t0, t0 + secs(12.5), STEP);
        let snapshot = board.snapshot();
        assert!(snapshot.active);
        assert_eq!(snapshot.phase_counts(), (0, 2, 2));
    }

    #[test]
    fn test_second_start_is_ignored() {
        let (mut board, _) = board(settings(2, 2));
        let t0 = Instant::now();
        board.start(t0);
        board.fire_due(t0);
        board.start(t0 + secs(1.0));
        assert_eq!(board.launcher().released(), 1);
    }
}
