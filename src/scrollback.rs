//! Paused-display scroll-back.
//!
//! While paused the column ring is reinterpreted as a browsable history:
//! a playhead anchored where the display stopped, plus a user-controlled
//! pixel offset, decide which historical ring column each screen column
//! shows. Every offset change invalidates the whole visible width, since
//! arbitrary history may now land on arbitrary screen columns.

use crate::columns::SCREEN_BUFFER_EXTRA;

/// Maximum scroll-back, as a multiple of the visible width. One screen of
/// headroom stays reserved so the playhead anchor itself can sit anywhere
/// inside the ring.
const MAX_OFFSET_SCREENS: usize = SCREEN_BUFFER_EXTRA - 1;

/// Pause anchor and scroll offset for one view.
pub struct ScrollbackController {
    paused: bool,
    /// Bitmap playhead position when the display was paused.
    pause_point: usize,
    /// Newest ring column at the time of pause.
    max_column: usize,
    /// User scroll offset in pixels, `[0, 3 × width]`.
    offset: f32,
    redraw: bool,
}

impl ScrollbackController {
    pub fn new() -> Self {
        Self {
            paused: false,
            pause_point: 0,
            max_column: 0,
            offset: 0.0,
            redraw: false,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Freeze the display: anchor at the current bitmap playhead and the
    /// newest ring column.
    pub fn pause(&mut self, playhead: usize, max_column: usize) {
        self.paused = true;
        self.pause_point = playhead;
        self.max_column = max_column;
        self.offset = 0.0;
        self.redraw = true;
    }

    /// Unfreeze: the offset resets and live aggregation continues.
    pub fn resume(&mut self) {
        self.paused = false;
        self.offset = 0.0;
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Set the scroll offset (drag or wheel), clamped to
    /// `[0, 3 × display_width]`. Larger offsets look further back.
    pub fn set_offset(&mut self, offset: f32, display_width: usize) {
        let clamped = offset.clamp(0.0, (MAX_OFFSET_SCREENS * display_width) as f32);
        if clamped != self.offset {
            self.offset = clamped;
            self.redraw = true;
        }
    }

    pub fn scroll_by(&mut self, delta: f32, display_width: usize) {
        self.set_offset(self.offset + delta, display_width);
    }

    /// Playhead position for the history mapping (anchor + offset).
    pub fn playhead(&self) -> usize {
        self.pause_point + self.offset as usize
    }

    /// Newest ring column captured at pause time.
    pub fn max_column(&self) -> usize {
        self.max_column
    }

    /// True once per offset change or pause: the whole width must be
    /// redrawn.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }
}

impl Default for ScrollbackController {
    fn default() -> Self {
        Self::new()
    }
}

/// Which ring column screen column `i` shows, given playhead `p`, right
/// edge `w` (visible width), newest ring column `m` and the ring size.
/// Columns left of the playhead read progressively older entries; columns
/// right of it read the most recent entries before it.
pub fn history_column(
    i: usize,
    playhead: usize,
    right_edge: usize,
    max_column: usize,
    screen_width: usize,
) -> usize {
    let (i, p, w, m) = (
        i as isize,
        playhead as isize,
        right_edge as isize,
        max_column as isize,
    );
    let index = if p > w {
        m - (p - w) - w + i
    } else if i < p {
        m - p + i
    } else {
        m - p + (i - w)
    };
    index.rem_euclid(screen_width as isize) as usize
}
