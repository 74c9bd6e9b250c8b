//! Card width estimation and scroll content width

use crate::config::config::LayoutConfig;
use crate::models::profile::ProfileRecord;
use crate::render::Sink;

/// Width model of a single profile card
#[derive(Debug, Clone)]
pub struct CardLayout {
    min_text_width: f64,
    glyph_width: f64,
    card_chrome: f64,
}

impl CardLayout {
    pub fn new(layout: &LayoutConfig) -> Self {
        Self {
            min_text_width: layout.min_text_width,
            glyph_width: layout.glyph_width,
            card_chrome: layout.card_chrome,
        }
    }

    /// Text column sized to the message, never narrower than the minimum
    pub fn text_width(&self, profile: &ProfileRecord) -> f64 {
        (profile.message_chars() as f64 * self.glyph_width).max(self.min_text_width)
    }

    pub fn card_width(&self, profile: &ProfileRecord) -> f64 {
        self.text_width(profile) + self.card_chrome
    }
}

/// Width of one copy of the board's first row
///
/// Rows hold contiguous slot numbers. Only one copy is measured since the
/// scroll wraps after exactly one copy has passed. Measured on every call.
pub fn content_width(sink: &dyn Sink, slot_count: usize, layout: &LayoutConfig) -> f64 {
    let per_row = slot_count.div_ceil(layout.rows.max(1));
    let cards: f64 = (0..per_row)
        .map(|slot| sink.width_of(slot) + layout.gap)
        .sum();
    let extras: f64 = layout.extra_cards.iter().map(|w| w + layout.gap).sum();
    cards + extras
}
