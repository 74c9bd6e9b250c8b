//! Slot data model
//!
//! A slot owns a fixed block of pool indices and cycles through it forever.
//! Runtime state is mutated only by the slot's own scheduler logic.

use serde::{Deserialize, Serialize};

use crate::error::{BoardError, Result};

/// Cyclic sequence over a slot's assigned pool indices
///
/// Position `p` maps to `profiles[p % capacity]`, so the sequence never runs out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSequence {
    profiles: Vec<usize>,
}

impl SlotSequence {
    pub fn new(profiles: Vec<usize>) -> Self {
        Self { profiles }
    }

    /// Pool index shown at a position
    pub fn at(&self, position: usize) -> usize {
        self.profiles[position % self.profiles.len()]
    }

    pub fn capacity(&self) -> usize {
        self.profiles.len()
    }

    /// The assigned block, in rotation order
    pub fn profiles(&self) -> &[usize] {
        &self.profiles
    }

    pub fn contains(&self, index: usize) -> bool {
        self.profiles.contains(&index)
    }

    /// First `len` entries of the unbounded sequence
    pub fn take(&self, len: usize) -> impl Iterator<Item = usize> + '_ {
        (0..len).map(|p| self.at(p))
    }
}

/// Planned slot: number plus its assigned sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSpec {
    pub slot: usize,
    pub sequence: SlotSequence,
}

impl SlotSpec {
    pub fn capacity(&self) -> usize {
        self.sequence.capacity()
    }
}

/// Half of a content swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPhase {
    /// Old content wiping out
    Out,
    /// New content wiping in
    In,
}

/// Scheduler state of one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SlotPhase {
    Stopped,
    /// Holding current content until the display time elapses
    Waiting,
    /// Swap in flight towards the pool index `next`
    Transitioning { next: usize, phase: TransitionPhase },
}

/// Per-slot runtime state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotRuntimeState {
    pub slot: usize,
    /// Position in the slot's cyclic sequence
    pub position: usize,
    pub phase: SlotPhase,
    /// Set once by the launcher, never cleared
    pub launched: bool,
    /// Completed swaps
    pub swaps: u64,
    /// Swaps skipped for missing content
    pub skipped: u64,
}

impl SlotRuntimeState {
    pub fn new(slot: usize) -> Self {
        Self {
            slot,
            position: 0,
            phase: SlotPhase::Stopped,
            launched: false,
            swaps: 0,
            skipped: 0,
        }
    }

    /// Stopped -> Waiting, at most once per board lifetime
    pub fn launch(&mut self) -> Result<()> {
        if self.launched || self.phase != SlotPhase::Stopped {
            return Err(self.invalid("launch"));
        }
        self.launched = true;
        self.phase = SlotPhase::Waiting;
        Ok(())
    }

    /// Waiting -> Transitioning (out-phase)
    pub fn begin_transition(&mut self, next: usize) -> Result<()> {
        if self.phase != SlotPhase::Waiting {
            return Err(self.invalid("begin transition"));
        }
        self.phase = SlotPhase::Transitioning {
            next,
            phase: TransitionPhase::Out,
        };
        Ok(())
    }

    /// Out-phase -> in-phase, returns the pool index being swapped in
    pub fn enter_in_phase(&mut self) -> Result<usize> {
        match self.phase {
            SlotPhase::Transitioning {
                next,
                phase: TransitionPhase::Out,
            } => {
                self.phase = SlotPhase::Transitioning {
                    next,
                    phase: TransitionPhase::In,
                };
                Ok(next)
            }
            _ => Err(self.invalid("enter in-phase")),
        }
    }

    /// Transitioning -> Waiting, advancing one position
    pub fn complete(&mut self, capacity: usize) -> Result<()> {
        if !self.is_transitioning() {
            return Err(self.invalid("complete transition"));
        }
        self.advance(capacity);
        self.swaps += 1;
        self.phase = SlotPhase::Waiting;
        Ok(())
    }

    /// Transitioning -> Waiting after a swap that failed to render
    pub fn complete_skipped(&mut self, capacity: usize) -> Result<()> {
        if !self.is_transitioning() {
            return Err(self.invalid("complete transition"));
        }
        self.advance(capacity);
        self.skipped += 1;
        self.phase = SlotPhase::Waiting;
        Ok(())
    }

    /// Advance past a swap that could not be shown; the slot keeps waiting
    pub fn skip(&mut self, capacity: usize) {
        self.advance(capacity);
        self.skipped += 1;
    }

    pub fn stop(&mut self) {
        self.phase = SlotPhase::Stopped;
    }

    /// Position the next swap moves to
    pub fn next_position(&self, capacity: usize) -> usize {
        (self.position + 1) % capacity
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.phase, SlotPhase::Transitioning { .. })
    }

    fn advance(&mut self, capacity: usize) {
        self.position = self.next_position(capacity);
    }

    fn invalid(&self, action: &str) -> BoardError {
        BoardError::Internal(format!(
            "slot {} cannot {} while {:?}",
            self.slot, action, self.phase
        ))
    }
}
