//! Timer wheel for the slot cycle
//!
//! Every slot owns at most one armed timer, keyed by slot number. Arming a key
//! again replaces its previous deadline; replaced and cancelled entries are
//! dropped lazily when they reach the top of the heap.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use tokio::time::Instant;

/// Owner of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    Slot(usize),
    Launcher,
}

/// What happens when a timer fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Display time over, start the out-phase
    DisplayElapsed(usize),
    /// Out-phase over, swap content and start the in-phase
    WipeOutDone(usize),
    /// In-phase over, the swap is complete
    TransitionDone(usize),
    /// Release the next launch wave
    LaunchWave,
}

impl TimerEvent {
    pub fn key(&self) -> TimerKey {
        match *self {
            TimerEvent::DisplayElapsed(slot)
            | TimerEvent::WipeOutDone(slot)
            | TimerEvent::TransitionDone(slot) => TimerKey::Slot(slot),
            TimerEvent::LaunchWave => TimerKey::Launcher,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    deadline: Instant,
    seq: u64,
    event: TimerEvent,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .cmp(&other.deadline)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Deadline-ordered timers, one per key
#[derive(Debug, Default)]
pub struct TimerWheel {
    heap: BinaryHeap<Reverse<Entry>>,
    /// key -> sequence number of its live entry
    armed: HashMap<TimerKey, u64>,
    next_seq: u64,
}

impl TimerWheel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `event` at `deadline`, replacing the key's previous timer
    pub fn arm(&mut self, deadline: Instant, event: TimerEvent) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.armed.insert(event.key(), seq);
        self.heap.push(Reverse(Entry {
            deadline,
            seq,
            event,
        }));
    }

    /// Disarm a key, returns whether a timer was armed
    pub fn cancel(&mut self, key: TimerKey) -> bool {
        self.armed.remove(&key).is_some()
    }

    pub fn is_armed(&self, key: TimerKey) -> bool {
        self.armed.contains_key(&key)
    }

    /// Armed event of a key
    pub fn armed_event(&self, key: TimerKey) -> Option<(Instant, TimerEvent)> {
        let seq = *self.armed.get(&key)?;
        self.heap
            .iter()
            .find(|Reverse(e)| e.seq == seq)
            .map(|Reverse(e)| (e.deadline, e.event))
    }

    /// Earliest live deadline
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.discard_stale();
        self.heap.peek().map(|Reverse(e)| e.deadline)
    }

    /// Pop the earliest timer if it is due at `now`
    ///
    /// Ties fire in arming order.
    pub fn pop_due(&mut self, now: Instant) -> Option<(Instant, TimerEvent)> {
        self.discard_stale();
        let due = matches!(self.heap.peek(), Some(Reverse(e)) if e.deadline <= now);
        if !due {
            return None;
        }
        let Reverse(entry) = self.heap.pop()?;
        self.armed.remove(&entry.event.key());
        Some((entry.deadline, entry.event))
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }

    fn discard_stale(&mut self) {
        while let Some(Reverse(top)) = self.heap.peek() {
            if self.armed.get(&top.event.key()) == Some(&top.seq) {
                break;
            }
            self.heap.pop();
        }
    }
}
