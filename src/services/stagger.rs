//! Stagger launcher
//!
//! Spreads slot start times so neighbouring slots do not swap in lockstep.
//! The launcher is a one-time ramp: once every slot is released it is done.

use std::time::Duration;

use crate::config::config::LaunchMode;
use crate::config::settings::StaggerSettings;

/// Launch waves, released one per interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaggerPlan {
    waves: Vec<Vec<usize>>,
    interval: Duration,
}

impl StaggerPlan {
    /// Build the wave order for `slot_count` slots
    ///
    /// Each wave holds a primary slot and its partner at `pair_offset`. The
    /// primary cursor moves by `step`; when it lands on a slot that already
    /// launched it slides forward to the next unlaunched one, so every slot is
    /// released exactly once even when `step` shares a factor with the count.
    pub fn new(slot_count: usize, settings: &StaggerSettings) -> Self {
        let waves = match settings.mode {
            LaunchMode::Simultaneous if slot_count > 0 => vec![(0..slot_count).collect()],
            LaunchMode::Simultaneous => Vec::new(),
            LaunchMode::Staggered => {
                stepped_waves(slot_count, settings.step.max(1), settings.pair_offset)
            }
        };

        Self {
            waves,
            interval: settings.interval,
        }
    }

    pub fn waves(&self) -> &[Vec<usize>] {
        &self.waves
    }

    pub fn wave(&self, index: usize) -> Option<&[usize]> {
        self.waves.get(index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.waves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    /// Delay of a wave relative to the first one
    pub fn offset_of(&self, index: usize) -> Duration {
        self.interval * index as u32
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

fn stepped_waves(slot_count: usize, step: usize, pair_offset: usize) -> Vec<Vec<usize>> {
    let mut launched = vec![false; slot_count];
    let mut remaining = slot_count;
    let mut cursor = 0;
    let mut waves = Vec::new();

    while remaining > 0 {
        while launched[cursor] {
            cursor = (cursor + 1) % slot_count;
        }

        let mut wave = vec![cursor];
        launched[cursor] = true;
        remaining -= 1;

        let partner = (cursor + pair_offset) % slot_count;
        if !launched[partner] {
            wave.push(partner);
            launched[partner] = true;
            remaining -= 1;
        }

        waves.push(wave);
        cursor = (cursor + step) % slot_count;
    }

    waves
}

/// Launch progress: which wave is released next
#[derive(Debug, Clone)]
pub struct StaggerLauncher {
    plan: StaggerPlan,
    next_wave: usize,
}

impl StaggerLauncher {
    pub fn new(plan: StaggerPlan) -> Self {
        Self { plan, next_wave: 0 }
    }

    /// Release the next wave, `None` once the ramp is done
    pub fn release(&mut self) -> Option<Vec<usize>> {
        let wave = self.plan.wave(self.next_wave)?.to_vec();
        self.next_wave += 1;
        Some(wave)
    }

    pub fn is_done(&self) -> bool {
        self.next_wave >= self.plan.len()
    }

    pub fn released(&self) -> usize {
        self.next_wave
    }

    pub fn plan(&self) -> &StaggerPlan {
        &self.plan
    }

    pub fn interval(&self) -> Duration {
        self.plan.interval()
    }

    /// Abandon the remaining waves
    pub fn cancel(&mut self) {
        self.next_wave = self.plan.len();
    }
}
