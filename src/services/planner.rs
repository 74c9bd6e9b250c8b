//! Slot assignment planner
//!
//! Splits the pool into contiguous blocks, one per slot, in slot order.

use tracing::debug;

use crate::error::{BoardError, Result};
use crate::models::slot::{SlotSequence, SlotSpec};

/// Plan every slot's sequence
///
/// A single cursor walks `0..pool_size` and each slot takes the next
/// `capacities[slot]` indices. The assignment must cover the pool exactly:
/// a mismatch is a configuration error, never truncated or padded.
pub fn plan_slots(pool_size: usize, capacities: &[usize]) -> Result<Vec<SlotSpec>> {
    if capacities.is_empty() {
        return Err(BoardError::NoSlots);
    }

    if let Some(slot) = capacities.iter().position(|&c| c == 0) {
        return Err(BoardError::ZeroCapacity { slot });
    }

    let assigned: usize = capacities.iter().sum();
    if assigned != pool_size {
        return Err(BoardError::CapacityMismatch {
            assigned,
            pool_size,
        });
    }

    let mut cursor = 0;
    let specs = capacities
        .iter()
        .enumerate()
        .map(|(slot, &capacity)| {
            let block = (cursor..cursor + capacity).collect();
            cursor += capacity;
            SlotSpec {
                slot,
                sequence: SlotSequence::new(block),
            }
        })
        .collect::<Vec<_>>();

    debug!(slots = specs.len(), pool_size, "Planned slot sequences");
    Ok(specs)
}

/// Plan with an explicit slot count, checking it against the capacity list
pub fn plan_with_count(
    pool_size: usize,
    slot_count: usize,
    capacities: &[usize],
) -> Result<Vec<SlotSpec>> {
    if slot_count == 0 {
        return Err(BoardError::NoSlots);
    }
    if capacities.len() != slot_count {
        return Err(BoardError::CapacityCount {
            slot_count,
            provided: capacities.len(),
        });
    }
    plan_slots(pool_size, capacities)
}
