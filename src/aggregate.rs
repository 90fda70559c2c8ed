//! Sample-to-pixel aggregation.
//!
//! Each poll consumes the source samples that arrived since the previous
//! poll and folds them into pixel columns (min/mean/max per channel, bit
//! code for the event lane). Two regimes, selected by the samples-per-pixel
//! ratio: aggregation (walk samples per column, track extrema) and
//! interpolation (linearly interpolate between neighbouring samples when
//! there are more pixels than samples). A per-lane fractional offset
//! carries sub-pixel progress between polls so the mapping never drifts.

use log::warn;

use crate::columns::{PixelColumnBuffer, SCREEN_BUFFER_EXTRA};
use crate::config::ViewConfig;
use crate::ring;
use crate::source::SourceBuffer;
use crate::trigger::TriggerController;

/// Fill amounts beyond this are treated as a stalled/reset source and the
/// poll is skipped for that lane.
const MAX_PIXELS_PER_POLL: f32 = 1_000_000.0;

/// What one poll did, as the renderer needs to see it.
#[derive(Clone, Copy, Debug, Default)]
pub struct PollOutcome {
    /// Dirty column span start (ring column of the first channel).
    pub dirty_from: usize,
    /// Dirty column span end, exclusive.
    pub dirty_to: usize,
    /// Columns filled for the first channel this poll.
    pub filled: usize,
    /// The column ring wrapped (or layout changed): redraw everything.
    pub full_redraw: bool,
    /// A trigger rewound the fill target to column zero this poll.
    pub rewound: bool,
}

/// Per-view consumer state: source read indices, column write indices and
/// fractional carries for every lane (data channels + event lane).
pub struct PixelAggregator {
    screen_width: usize,
    dbi: Vec<usize>,
    sbi: Vec<usize>,
    last_sbi: Vec<usize>,
    sub_offset: Vec<f32>,
    columns: PixelColumnBuffer,
}

impl PixelAggregator {
    pub fn new(num_channels: usize, display_width: usize) -> Self {
        let screen_width = display_width.max(1) * SCREEN_BUFFER_EXTRA;
        let lanes = num_channels + 1;
        Self {
            screen_width,
            dbi: vec![0; lanes],
            sbi: vec![0; lanes],
            last_sbi: vec![0; lanes],
            sub_offset: vec![0.0; lanes],
            columns: PixelColumnBuffer::new(num_channels, screen_width),
        }
    }

    /// Reallocate for a new channel count or display width. All column
    /// data is discarded; the caller forces a full redraw.
    pub fn resize(&mut self, num_channels: usize, display_width: usize) {
        warn!(
            "reallocating column buffers ({} channels, {} px wide)",
            num_channels, display_width
        );
        *self = Self::new(num_channels, display_width);
    }

    /// Re-anchor every lane's read index to the producer's current write
    /// index and drop fractional carries (no historical samples are
    /// consumed after a sync).
    pub fn sync(&mut self, source: &SourceBuffer) {
        for lane in 0..self.dbi.len() {
            self.dbi[lane] = source.write_index(lane);
            self.sub_offset[lane] = 0.0;
        }
    }

    /// Restart the column ring from the left edge and clear its contents.
    pub fn reset_columns(&mut self) {
        self.sbi.fill(0);
        self.last_sbi.fill(0);
        self.columns.clear_all();
    }

    pub fn columns(&self) -> &PixelColumnBuffer {
        &self.columns
    }

    /// Column ring capacity (`SCREEN_BUFFER_EXTRA` × display width).
    pub fn screen_width(&self) -> usize {
        self.screen_width
    }

    /// Current column write index for a lane.
    pub fn screen_buffer_index(&self, lane: usize) -> usize {
        self.sbi[lane]
    }

    /// Current source read index for a lane.
    pub fn display_buffer_index(&self, lane: usize) -> usize {
        self.dbi[lane]
    }

    /// Consume new source samples and fold them into pixel columns.
    ///
    /// Lanes are processed in order with the event lane last, so the trial
    /// counter increments only after every data channel has rewound.
    pub fn poll(
        &mut self,
        source: &SourceBuffer,
        config: &ViewConfig,
        trigger: &mut TriggerController,
    ) -> PollOutcome {
        let capacity = source.capacity();
        let ratio = config.ratio(source.sample_rate());
        let max_columns = trigger.max_columns(config.display_width, self.screen_width);
        let trigger_time = trigger.begin_poll(source);

        let mut outcome = PollOutcome::default();

        if trigger.holding() {
            // A completed trial is on screen; leave it until the next event.
            for lane in 0..self.sbi.len() {
                self.last_sbi[lane] = self.sbi[lane];
            }
            outcome.dirty_from = self.sbi[0];
            outcome.dirty_to = self.sbi[0];
            return outcome;
        }

        let event_lane = source.event_lane();

        for lane in 0..source.num_lanes() {
            let is_event = lane == event_lane;
            let mut dbi = self.dbi[lane];
            let new_index = source.write_index(lane);
            let mut new_samples = ring::distance(dbi, new_index, capacity);

            self.last_sbi[lane] = self.sbi[lane];

            if new_samples == 0 && trigger_time.is_none() {
                continue;
            }

            let mut sbi = self.sbi[lane];
            let mut off = self.sub_offset[lane];

            if let Some(t) = trigger_time {
                if trigger.wants_rewind(sbi) {
                    dbi = trigger.rewind_target(t, config.display_width, ratio, capacity);
                    new_samples = ring::distance(dbi, new_index, capacity);
                    off = 0.0;
                    sbi = 0;
                    self.last_sbi[lane] = 0;
                    if lane == 0 {
                        trigger.note_trial_started();
                        outcome.rewound = true;
                    }
                    if is_event {
                        trigger.note_rewind_complete();
                    }
                }
            }

            // Degenerate timing input: skip this lane's poll and resync.
            let pixels_estimate = new_samples as f32 / ratio + off;
            if !ratio.is_finite()
                || ratio <= 0.0
                || !pixels_estimate.is_finite()
                || pixels_estimate < 0.0
                || pixels_estimate > MAX_PIXELS_PER_POLL
            {
                warn!(
                    "skipping poll for lane {lane}: {new_samples} samples at ratio {ratio}"
                );
                self.dbi[lane] = new_index;
                self.sub_offset[lane] = 0.0;
                continue;
            }

            let weight = trigger.blend_weight();
            let mut remaining = new_samples;
            let mut filled = 0usize;
            let mut held = false;

            if ratio < 1.0 {
                // Interpolation regime: more pixels than samples.
                while remaining > 0 {
                    let prev = source.sample(lane, ring::step_back(dbi, 1, capacity));
                    let cur = source.sample(lane, dbi);

                    if is_event {
                        self.columns.set_event(sbi, cur);
                    } else {
                        let val = prev * (1.0 - off) + cur * off;
                        match weight {
                            Some(n) => self.columns.blend_column(lane, sbi, val, val, val, n),
                            None => self.columns.set_column(lane, sbi, val, val, val),
                        }
                    }

                    off += ratio;
                    if off >= 1.0 {
                        off -= 1.0;
                        dbi = ring::step(dbi, 1, capacity);
                        remaining -= 1;
                    }

                    filled += 1;
                    sbi += 1;
                    if trigger.line().is_some() && sbi == max_columns - 1 {
                        if is_event {
                            trigger.note_reached_end();
                        }
                        held = true;
                        break;
                    }
                    sbi %= max_columns;
                    if sbi == 0 {
                        outcome.full_redraw = true;
                    }
                }
            } else {
                // Aggregation regime: walk samples per column, tracking
                // extrema; only complete columns are written, the rest
                // stays in the ring for the next poll.
                loop {
                    let need = (off + ratio) as usize;
                    if need == 0 || need > remaining {
                        break;
                    }

                    let mut sample_min = f32::MAX;
                    let mut sample_max = f32::MIN;
                    let mut sum = 0.0f32;
                    for _ in 0..need {
                        let s = source.sample(lane, dbi);
                        sum += s;
                        sample_min = sample_min.min(s);
                        sample_max = sample_max.max(s);
                        dbi = ring::step(dbi, 1, capacity);
                    }
                    remaining -= need;
                    off = off + ratio - need as f32;
                    let sample_mean = sum / need as f32;

                    if is_event {
                        self.columns.set_event(sbi, sample_max);
                    } else {
                        // Clamp against the previous column so sub-pixel
                        // runs join into a continuous stair-trace.
                        if sbi > 0 {
                            let prev_min = self.columns.min(lane, sbi - 1);
                            let prev_max = self.columns.max(lane, sbi - 1);
                            if sample_max < prev_min {
                                sample_max = prev_min;
                            }
                            if sample_min > prev_max {
                                sample_min = prev_max;
                            }
                        }
                        match weight {
                            Some(n) => self.columns.blend_column(
                                lane,
                                sbi,
                                sample_min,
                                sample_mean,
                                sample_max,
                                n,
                            ),
                            None => self.columns.set_column(
                                lane,
                                sbi,
                                sample_min,
                                sample_mean,
                                sample_max,
                            ),
                        }
                    }

                    filled += 1;
                    sbi += 1;
                    if trigger.line().is_some() && sbi == max_columns - 1 {
                        if is_event {
                            trigger.note_reached_end();
                        }
                        held = true;
                        break;
                    }
                    sbi %= max_columns;
                    if sbi == 0 {
                        outcome.full_redraw = true;
                    }
                }
            }

            self.sbi[lane] = sbi;
            self.sub_offset[lane] = off;
            // While held at the far edge the unconsumed tail is abandoned;
            // the next trigger rewinds the read index anyway.
            self.dbi[lane] = if held { new_index } else { dbi };

            if lane == 0 {
                outcome.filled = filled;
            }
        }

        trigger.end_poll();

        outcome.dirty_from = self.last_sbi[0];
        outcome.dirty_to = self.sbi[0];
        outcome
    }
}
