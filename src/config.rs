//! Per-view display configuration.
//!
//! One `ViewConfig` is owned by each split view and passed explicitly into
//! the aggregator and renderer; there is no shared global options state.
//! The out-of-scope options UI mutates a view's config through the
//! [`crate::view::ScopeView`] setters.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// DrawMethod – column plotting strategy selector
// ─────────────────────────────────────────────────────────────────────────────

/// Which column-plotting strategy the renderer uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawMethod {
    /// One vertical line from column min to column max.
    PerPixel,
    /// Density-weighted brightness gradient across the column span.
    Supersampled,
}

// ─────────────────────────────────────────────────────────────────────────────
// ViewConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration values consumed on every poll.
///
/// | Field                  | Purpose |
/// |------------------------|---------|
/// | `timebase`             | Seconds of data visible across the width |
/// | `display_width`        | Visible trace width in pixels |
/// | `channel_height`       | Vertical band height per channel (px) |
/// | `overlap_factor`       | Allowed overdraw beyond the band, as a fraction of its height |
/// | `draw_method`          | Column plotting strategy |
/// | `event_display`        | Per-TTL-line overlay enable flags |
/// | `saturation_threshold` | Absolute input level treated as amplifier saturation |
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Seconds of data visible across the display width.
    pub timebase: f32,
    /// Visible trace width in pixels.
    pub display_width: usize,
    /// Height of one channel's vertical band, in pixels.
    pub channel_height: usize,
    /// How far a trace may draw past its band, as a fraction of the band
    /// height. `0.5` keeps the trace inside the band.
    pub overlap_factor: f32,
    /// Column plotting strategy.
    pub draw_method: DrawMethod,
    /// Which of the 8 TTL event lines are overlaid on the traces.
    pub event_display: [bool; crate::source::EVENT_LINES],
    /// Absolute input level (same units as the samples) above which the
    /// saturation warning pattern is drawn.
    pub saturation_threshold: f32,
    /// Draw markers where the trace was clipped to its band.
    pub clip_warning: bool,
    /// Draw the saturation warning pattern.
    pub saturation_warning: bool,
    /// Subtract each channel's running mean before plotting.
    pub median_offset: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            timebase: 1.0,
            display_width: 512,
            channel_height: 40,
            overlap_factor: 0.5,
            draw_method: DrawMethod::PerPixel,
            event_display: [false; crate::source::EVENT_LINES],
            saturation_threshold: 500.0,
            clip_warning: true,
            saturation_warning: false,
            median_offset: false,
        }
    }
}

impl ViewConfig {
    /// Samples per pixel at the current timebase/width for `sample_rate`.
    /// Below `1.0` the aggregator interpolates instead of aggregating.
    pub fn ratio(&self, sample_rate: f32) -> f32 {
        sample_rate * self.timebase / self.display_width as f32
    }
}
