//! Shared source-side ring buffer filled by the acquisition callback.
//!
//! A [`SourceBuffer`] holds one ring lane per data channel plus one extra
//! lane carrying the TTL event bit-code, mirroring the data layout the
//! aggregator consumes. The producer (audio/acquisition callback) writes
//! sample blocks and advances per-lane write indices; any number of views
//! may read. The only synchronization is a short mutex around index
//! publication; samples themselves are copied outside the lock, and a
//! consumer that snapshots an index under the lock is guaranteed to see
//! every sample committed before it.
//!
//! Overrun (producer lapping a consumer mid-read) is prevented by sizing
//! the capacity for the poll rate, not by blocking; a consumer that falls
//! absurdly far behind skips and resyncs (see `aggregate`).

use std::collections::HashMap;
use std::sync::Mutex;

use crate::ring::{self, SampleRing};
use crate::trigger::TriggerPolarity;

/// Number of TTL event lines carried by the event lane.
pub const EVENT_LINES: usize = 8;

struct TriggerWatch {
    line: usize,
    polarity: TriggerPolarity,
    /// Ring index of the most recent matching event, until acknowledged.
    latest: Option<usize>,
}

struct Shared {
    /// Committed write index per lane, in `[0, capacity)`.
    write: Vec<usize>,
    /// Current TTL line states as a bit code.
    ttl_state: u32,
    /// Event-lane index where the current producer block began.
    block_start: usize,
    block_len: usize,
    /// Per-view trigger watches, keyed by view id.
    watches: HashMap<usize, TriggerWatch>,
}

/// Multi-channel sample ring shared between one producer and many views.
pub struct SourceBuffer {
    sample_rate: f32,
    lanes: Vec<SampleRing>,
    shared: Mutex<Shared>,
}

impl SourceBuffer {
    /// Create a buffer for `num_channels` data channels (one event lane is
    /// added internally). `capacity` is per-lane, in samples.
    pub fn new(num_channels: usize, capacity: usize, sample_rate: f32) -> Self {
        let lanes = (0..num_channels + 1)
            .map(|_| SampleRing::new(capacity))
            .collect();
        Self {
            sample_rate,
            lanes,
            shared: Mutex::new(Shared {
                write: vec![0; num_channels + 1],
                ttl_state: 0,
                block_start: 0,
                block_len: 0,
                watches: HashMap::new(),
            }),
        }
    }

    pub fn num_channels(&self) -> usize {
        self.lanes.len() - 1
    }

    /// Total lane count, data channels plus the event lane.
    pub fn num_lanes(&self) -> usize {
        self.lanes.len()
    }

    /// Index of the event lane (always the last lane).
    pub fn event_lane(&self) -> usize {
        self.lanes.len() - 1
    }

    pub fn capacity(&self) -> usize {
        self.lanes[0].capacity()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    // ── Producer side ────────────────────────────────────────────────────

    /// Start a producer block of `num_samples`: pre-fills the event lane
    /// with the current TTL state. Call before `push_samples`/`add_event`.
    pub fn begin_block(&self, num_samples: usize) {
        let (start, ttl) = {
            let mut shared = self.shared.lock().unwrap();
            let start = shared.write[self.event_lane()];
            shared.block_start = start;
            shared.block_len = num_samples;
            (start, shared.ttl_state)
        };
        self.lanes[self.event_lane()].fill(start, num_samples, ttl as f32);
    }

    /// Append one channel's samples for the current block and publish the
    /// new write index. The lock is held only for the index update.
    pub fn push_samples(&self, channel: usize, samples: &[f32]) {
        let start = {
            let shared = self.shared.lock().unwrap();
            shared.write[channel]
        };
        self.lanes[channel].copy_from(start, samples);
        let mut shared = self.shared.lock().unwrap();
        shared.write[channel] = ring::step(start, samples.len(), self.capacity());
    }

    /// Record a TTL transition `offset` samples into the current block.
    /// The event lane is rewritten from the transition to the block end,
    /// and any matching trigger watch records the event's ring index.
    pub fn add_event(&self, offset: usize, line: usize, high: bool) {
        if line >= EVENT_LINES {
            return;
        }
        let (start, len, ttl) = {
            let mut shared = self.shared.lock().unwrap();
            if high {
                shared.ttl_state |= 1 << line;
            } else {
                shared.ttl_state &= !(1 << line);
            }
            let event_index = ring::step(shared.block_start, offset, self.capacity());
            for watch in shared.watches.values_mut() {
                let matches = watch.line == line
                    && match watch.polarity {
                        TriggerPolarity::Rising => high,
                        TriggerPolarity::Falling => !high,
                    };
                if matches {
                    watch.latest = Some(event_index);
                }
            }
            (shared.block_start, shared.block_len, shared.ttl_state)
        };
        if offset < len {
            self.lanes[self.event_lane()].fill(
                ring::step(start, offset, self.capacity()),
                len - offset,
                ttl as f32,
            );
        }
    }

    /// Finish the current block: publishes the event-lane write index.
    pub fn end_block(&self) {
        let mut shared = self.shared.lock().unwrap();
        let next = ring::step(shared.block_start, shared.block_len, self.capacity());
        shared.write[self.event_lane()] = next;
        shared.block_len = 0;
    }

    // ── Consumer side ────────────────────────────────────────────────────

    /// Snapshot one lane's committed write index.
    pub fn write_index(&self, lane: usize) -> usize {
        self.shared.lock().unwrap().write[lane]
    }

    /// Read one sample; safe for any index at or behind the committed
    /// write index for this lane.
    pub fn sample(&self, lane: usize, index: usize) -> f32 {
        self.lanes[lane].load(index)
    }

    // ── Trigger watches ──────────────────────────────────────────────────

    /// Select (or clear) the TTL line a view triggers on.
    pub fn set_trigger(&self, view: usize, line: Option<usize>, polarity: TriggerPolarity) {
        let mut shared = self.shared.lock().unwrap();
        match line {
            Some(line) => {
                shared.watches.insert(
                    view,
                    TriggerWatch {
                        line,
                        polarity,
                        latest: None,
                    },
                );
            }
            None => {
                shared.watches.remove(&view);
            }
        }
    }

    /// Ring index of the latest unacknowledged trigger event for a view.
    pub fn latest_trigger_time(&self, view: usize) -> Option<usize> {
        let shared = self.shared.lock().unwrap();
        shared.watches.get(&view).and_then(|w| w.latest)
    }

    /// Clear a view's pending trigger so the next poll does not re-arm.
    pub fn acknowledge_trigger(&self, view: usize) {
        let mut shared = self.shared.lock().unwrap();
        if let Some(watch) = shared.watches.get_mut(&view) {
            watch.latest = None;
        }
    }
}
