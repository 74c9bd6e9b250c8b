//! In-memory mirrored board
//!
//! Holds every rendered copy of every slot. Copies of one slot form a mirror
//! group; all mutations go through [`MirrorBoard::apply_to_mirror_group`] under
//! one lock, so no observer sees group members disagree.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;

use crate::config::config::LayoutConfig;
use crate::error::{BoardError, Result};
use crate::models::slot::TransitionPhase;
use crate::render::layout::CardLayout;
use crate::render::{RenderIntent, Sink};

/// One rendered element
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotElement {
    pub element_id: usize,
    /// Which copy of the board the element belongs to
    pub copy: usize,
    /// Logical slot number
    pub slot: usize,
    pub profile_id: Option<i64>,
    pub profile_index: Option<usize>,
    pub width: f64,
    pub accent: usize,
    pub phase: Option<TransitionPhase>,
    pub asset_ready: bool,
}

impl SlotElement {
    fn blank(element_id: usize, copy: usize, slot: usize, width: f64) -> Self {
        Self {
            element_id,
            copy,
            slot,
            profile_id: None,
            profile_index: None,
            width,
            accent: 0,
            phase: None,
            asset_ready: false,
        }
    }
}

#[derive(Debug, Default)]
struct MirrorInner {
    elements: Vec<SlotElement>,
    /// slot number -> element positions
    groups: HashMap<usize, Vec<usize>>,
    offset: f64,
}

/// Board rendered `copies` times end to end
#[derive(Debug)]
pub struct MirrorBoard {
    card: CardLayout,
    inner: Mutex<MirrorInner>,
}

impl MirrorBoard {
    pub fn new(slot_count: usize, layout: &LayoutConfig) -> Self {
        let card = CardLayout::new(layout);
        let blank_width = layout.min_text_width + layout.card_chrome;
        let mut inner = MirrorInner::default();

        for copy in 0..layout.copies.max(1) {
            for slot in 0..slot_count {
                let id = inner.elements.len();
                inner
                    .elements
                    .push(SlotElement::blank(id, copy, slot, blank_width));
                inner.groups.entry(slot).or_default().push(id);
            }
        }

        Self {
            card,
            inner: Mutex::new(inner),
        }
    }

    /// Apply one operation to every element tagged with `slot`
    ///
    /// Returns the number of elements updated.
    pub fn apply_to_mirror_group<F>(&self, slot: usize, mut render_fn: F) -> Result<usize>
    where
        F: FnMut(&mut SlotElement),
    {
        let mut inner = self.inner.lock();
        let MirrorInner {
            elements, groups, ..
        } = &mut *inner;

        let members = groups
            .get(&slot)
            .filter(|m| !m.is_empty())
            .ok_or(BoardError::EmptyMirrorGroup { slot })?;

        for &id in members {
            render_fn(&mut elements[id]);
        }
        Ok(members.len())
    }

    /// Snapshot of a slot's mirror group
    pub fn group(&self, slot: usize) -> Vec<SlotElement> {
        let inner = self.inner.lock();
        inner
            .groups
            .get(&slot)
            .map(|members| members.iter().map(|&id| inner.elements[id].clone()).collect())
            .unwrap_or_default()
    }

    /// Whether every member of the group shows the same profile and width
    pub fn is_consistent(&self, slot: usize) -> bool {
        let group = self.group(slot);
        group.windows(2).all(|pair| {
            pair[0].profile_id == pair[1].profile_id && pair[0].width == pair[1].width
        })
    }

    /// Profile currently shown by a slot
    pub fn displayed(&self, slot: usize) -> Option<i64> {
        self.group(slot).first().and_then(|e| e.profile_id)
    }

    pub fn element_count(&self) -> usize {
        self.inner.lock().elements.len()
    }

    pub fn scroll_offset(&self) -> f64 {
        self.inner.lock().offset
    }
}

impl Sink for MirrorBoard {
    fn render(&self, slot: usize, intent: &RenderIntent<'_>) -> Result<()> {
        let width = self.card.card_width(intent.profile);
        self.apply_to_mirror_group(slot, |element| {
            element.profile_id = Some(intent.profile.id);
            element.profile_index = Some(intent.index);
            element.width = width;
            element.accent = intent.accent;
            element.asset_ready = intent.asset_ready;
        })?;
        Ok(())
    }

    fn phase(&self, slot: usize, phase: TransitionPhase) {
        // a missing group already surfaces through render
        let _ = self.apply_to_mirror_group(slot, |element| element.phase = Some(phase));
    }

    fn width_of(&self, slot: usize) -> f64 {
        self.group(slot).first().map(|e| e.width).unwrap_or(0.0)
    }

    fn scroll_to(&self, offset: f64) {
        self.inner.lock().offset = offset;
    }
}
