//! Serde snapshot of a view's adjustable display settings.
//!
//! The out-of-scope options layer serialises this instead of poking at
//! view internals; `apply_to` restores a snapshot through the public
//! setters so all layout/redraw side effects happen.

use serde::{Deserialize, Serialize};

use crate::config::{DrawMethod, ViewConfig};
use crate::source::EVENT_LINES;
use crate::trigger::TriggerPolarity;
use crate::view::ScopeView;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ViewStateSerde {
    pub timebase: f32,
    pub display_width: usize,
    pub channel_height: usize,
    pub overlap_factor: f32,
    pub draw_method: DrawMethod,
    pub event_display: [bool; EVENT_LINES],
    pub saturation_threshold: f32,
    pub clip_warning: bool,
    pub saturation_warning: bool,
    pub median_offset: bool,
    pub ranges: Vec<f32>,
    pub inverted: Vec<bool>,
    pub enabled: Vec<bool>,
    pub trigger_line: Option<usize>,
    pub trigger_polarity: TriggerPolarity,
    pub averaging: bool,
}

impl From<&ScopeView> for ViewStateSerde {
    fn from(view: &ScopeView) -> Self {
        let config: &ViewConfig = view.config();
        Self {
            timebase: config.timebase,
            display_width: config.display_width,
            channel_height: config.channel_height,
            overlap_factor: config.overlap_factor,
            draw_method: config.draw_method,
            event_display: config.event_display,
            saturation_threshold: config.saturation_threshold,
            clip_warning: config.clip_warning,
            saturation_warning: config.saturation_warning,
            median_offset: config.median_offset,
            ranges: view.channels().iter().map(|c| c.range).collect(),
            inverted: view.channels().iter().map(|c| c.inverted).collect(),
            enabled: view.channels().iter().map(|c| c.enabled).collect(),
            trigger_line: view.trigger_line(),
            trigger_polarity: view.trigger_polarity(),
            averaging: view.averaging(),
        }
    }
}

impl ViewStateSerde {
    /// Restore the snapshot onto a view. Channel vectors are applied up
    /// to the channel count the view currently has.
    pub fn apply_to(&self, view: &mut ScopeView) {
        view.set_display_width(self.display_width);
        view.set_timebase(self.timebase);
        view.set_channel_height(self.channel_height);
        view.set_overlap_factor(self.overlap_factor);
        view.set_draw_method(self.draw_method);
        for line in 0..EVENT_LINES {
            view.set_event_display(line, self.event_display[line]);
        }
        view.set_saturation_threshold(self.saturation_threshold);
        view.set_clip_warning(self.clip_warning);
        view.set_saturation_warning(self.saturation_warning);
        view.set_median_offset(self.median_offset);
        for ch in 0..view.channels().len() {
            if let Some(&r) = self.ranges.get(ch) {
                view.set_channel_range(ch, r);
            }
            if let Some(&inv) = self.inverted.get(ch) {
                view.set_channel_inverted(ch, inv);
            }
            if let Some(&en) = self.enabled.get(ch) {
                view.set_channel_enabled(ch, en);
            }
        }
        view.set_averaging(self.averaging);
        view.set_trigger_channel(self.trigger_line, self.trigger_polarity);
    }
}
