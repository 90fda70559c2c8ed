//! Trigger-synchronized display control.
//!
//! Tracks the trigger state machine for one view and the trial counter
//! used for online averaging. The aggregator drives the transitions; this
//! type owns the bookkeeping so the phases stay observable and testable.

use serde::{Deserialize, Serialize};

use crate::ring;
use crate::source::SourceBuffer;

/// Edge polarity a trigger watch fires on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerPolarity {
    Rising,
    Falling,
}

/// Where the view is in the trigger cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerPhase {
    /// No trigger line selected; free-running display.
    Idle,
    /// Waiting for the next event on the selected line.
    Armed,
    /// A trigger fired; lanes are being rewound this poll.
    Rewinding,
    /// Normal fill from column zero until the far edge.
    Filling,
}

/// Per-view trigger state machine and trial-averaging bookkeeping.
pub struct TriggerController {
    view: usize,
    line: Option<usize>,
    polarity: TriggerPolarity,
    averaging: bool,
    /// Completed trials; `-1` until the first trigger of a fresh cycle.
    trials: i32,
    phase: TriggerPhase,
    /// Ring index of the trigger being applied during the current poll.
    pending: Option<usize>,
    /// The column buffer reached the far edge; hold until the next event.
    reached_end: bool,
}

impl TriggerController {
    pub fn new(view: usize) -> Self {
        Self {
            view,
            line: None,
            polarity: TriggerPolarity::Rising,
            averaging: false,
            trials: -1,
            phase: TriggerPhase::Idle,
            pending: None,
            reached_end: false,
        }
    }

    pub fn phase(&self) -> TriggerPhase {
        self.phase
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn polarity(&self) -> TriggerPolarity {
        self.polarity
    }

    pub fn averaging(&self) -> bool {
        self.averaging
    }

    /// Completed trial count (`-1` before the first trigger).
    pub fn trials(&self) -> i32 {
        self.trials
    }

    /// Select (or clear) the trigger line. Changing the line restarts the
    /// trial cycle.
    pub fn set_line(&mut self, source: &SourceBuffer, line: Option<usize>, polarity: TriggerPolarity) {
        self.line = line;
        self.polarity = polarity;
        self.trials = -1;
        self.pending = None;
        self.reached_end = false;
        self.phase = if line.is_some() {
            TriggerPhase::Armed
        } else {
            TriggerPhase::Idle
        };
        source.set_trigger(self.view, line, polarity);
    }

    /// Enable/disable trial averaging. Toggling restarts the trial counter
    /// so the next trigger starts a fresh trace.
    pub fn set_averaging(&mut self, averaging: bool) {
        if self.averaging != averaging {
            self.trials = -1;
        }
        self.averaging = averaging;
    }

    pub fn reset_trials(&mut self) {
        self.trials = -1;
    }

    /// Poll start: fetch and acknowledge the latest trigger event, if any.
    pub fn begin_poll(&mut self, source: &SourceBuffer) -> Option<usize> {
        if self.line.is_none() {
            return None;
        }
        let latest = source.latest_trigger_time(self.view);
        if let Some(t) = latest {
            source.acknowledge_trigger(self.view);
            self.pending = Some(t);
        }
        self.pending
    }

    /// Column capacity for the current mode: trigger mode fills only the
    /// visible width, free-running mode the whole 4× buffer.
    pub fn max_columns(&self, display_width: usize, screen_width: usize) -> usize {
        if self.line.is_some() {
            display_width
        } else {
            screen_width
        }
    }

    /// A completed trial is on screen and no new trigger has arrived:
    /// nothing may be overwritten.
    pub fn holding(&self) -> bool {
        self.line.is_some() && self.pending.is_none() && self.reached_end
    }

    /// Whether a lane at screen-buffer index `sbi` should rewind this poll.
    pub fn wants_rewind(&self, sbi: usize) -> bool {
        self.pending.is_some() && (sbi == 0 || self.reached_end)
    }

    /// Rewind target: put the trigger point about one-third across the
    /// view, never reaching back further than half the source holds.
    pub fn rewind_target(
        &self,
        trigger_time: usize,
        display_width: usize,
        ratio: f32,
        capacity: usize,
    ) -> usize {
        let screen_third = (display_width as f32 * ratio / 3.0) as usize;
        let lookback = screen_third.min(capacity / 2);
        ring::step_back(trigger_time, lookback, capacity)
    }

    /// First channel rewound: a new trial begins.
    pub fn note_trial_started(&mut self) {
        self.trials += 1;
        self.phase = TriggerPhase::Rewinding;
        log::debug!("trigger rewind, trial {}", self.trials);
    }

    /// Event lane rewound: every lane restarted from column zero, the
    /// pending trigger is consumed and normal fill resumes.
    pub fn note_rewind_complete(&mut self) {
        self.pending = None;
        self.reached_end = false;
        self.phase = TriggerPhase::Filling;
    }

    /// Event lane hit the far edge: hold for the next trigger.
    pub fn note_reached_end(&mut self) {
        self.reached_end = true;
        self.phase = TriggerPhase::Armed;
    }

    /// Poll end: a trigger that arrived mid-fill could not be applied and
    /// is dropped (the display finishes the current sweep first).
    pub fn end_poll(&mut self) {
        if self.pending.take().is_some() {
            log::debug!("dropping trigger that arrived mid-sweep");
        }
    }

    /// Weight for the incremental-mean column update, when averaging
    /// applies this poll.
    pub fn blend_weight(&self) -> Option<i32> {
        if self.line.is_some() && self.averaging && self.trials > 0 {
            Some(self.trials)
        } else {
            None
        }
    }
}
