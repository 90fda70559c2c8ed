//! Per-channel running statistics.
//!
//! Mean and RMS over a decayed sampling of the source ring (every other
//! sample, at most half the capacity), refreshed every half screen-width
//! of newly filled columns. Consumed by the median-offset plotting mode
//! and by external single-channel detail overlays.

use crate::aggregate::PixelAggregator;
use crate::ring;
use crate::source::SourceBuffer;

pub struct ChannelStats {
    mean: Vec<f32>,
    rms: Vec<f32>,
}

impl ChannelStats {
    pub fn new(num_channels: usize) -> Self {
        Self {
            mean: vec![0.0; num_channels],
            rms: vec![0.0; num_channels],
        }
    }

    pub fn mean(&self, channel: usize) -> f32 {
        self.mean[channel]
    }

    pub fn rms(&self, channel: usize) -> f32 {
        self.rms[channel]
    }

    /// Recompute all channels from the samples behind each channel's
    /// current read position.
    pub fn refresh(&mut self, source: &SourceBuffer, aggregator: &PixelAggregator) {
        let capacity = source.capacity();
        let span = capacity / 2;
        for channel in 0..self.mean.len() {
            let anchor = aggregator.display_buffer_index(channel);
            let mut total = 0.0f32;
            let mut squares = 0.0f32;
            let mut count = 0u32;
            let mut back = 0;
            while back < span {
                let s = source.sample(channel, ring::step_back(anchor, back + 1, capacity));
                total += s;
                squares += s * s;
                count += 1;
                back += 2;
            }
            if count > 0 {
                self.mean[channel] = total / count as f32;
                self.rms[channel] = (squares / count as f32).sqrt();
            }
        }
    }
}
