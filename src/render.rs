//! Persistent-bitmap rendering.
//!
//! The renderer owns one premultiplied-RGBA surface per view and keeps it
//! consistent with the pixel-column buffers, clearing and redrawing only
//! the dirty column span each poll (or the whole width on wrap, layout
//! change or scroll-back). Every pixel write is bounds-clamped: this is a
//! hot path and an off-by-one at a wrap boundary must never panic.

use tiny_skia::{ColorU8, Pixmap, PremultipliedColorU8};

use crate::aggregate::PollOutcome;
use crate::channels::Channel;
use crate::color_scheme::ColorScheme;
use crate::columns::PixelColumnBuffer;
use crate::config::ViewConfig;
use crate::plotters::{ColumnInfo, ColumnPlotter};
use crate::scrollback;
use crate::source::EVENT_LINES;
use crate::stats::ChannelStats;

/// Alpha at which TTL event overlays are blended onto the traces.
const EVENT_OVERLAY_ALPHA: f32 = 0.3;

/// Period of the saturation warning's alternating pattern, in pixels.
const SATURATION_PATTERN: i32 = 50;

/// Inputs the renderer needs for one pass, borrowed from the view.
pub struct RenderContext<'a> {
    pub columns: &'a PixelColumnBuffer,
    pub channels: &'a [Channel],
    pub config: &'a ViewConfig,
    pub scheme: &'a ColorScheme,
    pub plotter: &'a dyn ColumnPlotter,
    pub stats: &'a ChannelStats,
    /// Vertical crop of the channel stack currently scrolled into view;
    /// `None` draws every enabled channel.
    pub viewport: Option<(usize, usize)>,
}

/// Bounds-clamped pixel access over the persistent surface.
pub struct TraceBitmap {
    pixmap: Pixmap,
}

impl TraceBitmap {
    pub fn new(width: usize, height: usize) -> Self {
        let pixmap = Pixmap::new(width.max(1) as u32, height.max(1) as u32)
            .expect("bitmap dimensions are non-zero");
        Self { pixmap }
    }

    pub fn width(&self) -> usize {
        self.pixmap.width() as usize
    }

    pub fn height(&self) -> usize {
        self.pixmap.height() as usize
    }

    /// Read-only view of the surface for display or export.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Write one pixel; writes outside the surface are dropped.
    pub fn set(&mut self, x: i32, y: i32, colour: PremultipliedColorU8) {
        let (w, h) = (self.pixmap.width() as i32, self.pixmap.height() as i32);
        if x < 0 || y < 0 || x >= w || y >= h {
            return;
        }
        let index = (y * w + x) as usize;
        self.pixmap.pixels_mut()[index] = colour;
    }

    pub fn get(&self, x: i32, y: i32) -> Option<PremultipliedColorU8> {
        let (w, h) = (self.pixmap.width() as i32, self.pixmap.height() as i32);
        if x < 0 || y < 0 || x >= w || y >= h {
            return None;
        }
        Some(self.pixmap.pixels()[(y * w + x) as usize])
    }

    /// Mix `colour` over the existing pixel by `alpha`.
    pub fn blend(&mut self, x: i32, y: i32, colour: ColorU8, alpha: f32) {
        let Some(existing) = self.get(x, y) else {
            return;
        };
        let existing = existing.demultiply();
        let l = |e: u8, c: u8| (e as f32 + (c as f32 - e as f32) * alpha).round() as u8;
        let mixed = ColorU8::from_rgba(
            l(existing.red(), colour.red()),
            l(existing.green(), colour.green()),
            l(existing.blue(), colour.blue()),
            255,
        );
        self.set(x, y, mixed.premultiply());
    }

    /// Fill one column, full height.
    pub fn clear_column(&mut self, x: usize, colour: ColorU8) {
        let premult = colour.premultiply();
        for y in 0..self.height() as i32 {
            self.set(x as i32, y, premult);
        }
    }

    pub fn clear_all(&mut self, colour: ColorU8) {
        let premult = colour.premultiply();
        for p in self.pixmap.pixels_mut() {
            *p = premult;
        }
    }
}

/// Keeps the persistent bitmap consistent with the column buffers.
pub struct BitmapRenderer {
    bitmap: TraceBitmap,
    /// Bitmap column the next filled pixel column lands in.
    playhead: usize,
    /// Columns filled since the last statistics refresh.
    columns_filled: usize,
    full_redraw: bool,
}

impl BitmapRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            bitmap: TraceBitmap::new(width, height),
            playhead: 0,
            columns_filled: 0,
            full_redraw: true,
        }
    }

    pub fn bitmap(&self) -> &TraceBitmap {
        &self.bitmap
    }

    pub fn playhead(&self) -> usize {
        self.playhead
    }

    /// Drop and recreate the surface (layout or channel-count change).
    pub fn resize(&mut self, width: usize, height: usize) {
        self.bitmap = TraceBitmap::new(width, height);
        self.playhead = 0;
        self.full_redraw = true;
    }

    pub fn request_full_redraw(&mut self) {
        self.full_redraw = true;
    }

    pub fn wants_full_redraw(&self) -> bool {
        self.full_redraw
    }

    pub fn reset_playhead(&mut self) {
        self.playhead = 0;
    }

    /// Live pass: apply one poll's dirty span to the bitmap. Returns true
    /// when enough columns accumulated that the per-channel statistics
    /// should be refreshed.
    pub fn render_live(&mut self, ctx: &RenderContext<'_>, outcome: &PollOutcome) -> bool {
        let width = self.bitmap.width();
        if outcome.rewound {
            self.playhead = 0;
        }

        let filled = outcome.filled;
        let screen_width = ctx.columns.width();

        if outcome.full_redraw || self.full_redraw || filled >= width {
            self.full_redraw = false;
            self.playhead = (self.playhead + filled) % width;
            self.redraw_all(ctx, self.playhead, outcome.dirty_to);
        } else if filled > 0 {
            let marker_x = (self.playhead + filled) % width;
            for k in 0..filled {
                self.bitmap
                    .clear_column((self.playhead + k) % width, ctx.scheme.background);
            }
            self.bitmap.clear_column(marker_x, ctx.scheme.background);
            for k in 0..filled {
                let x = (self.playhead + k) % width;
                let ring_col = (outcome.dirty_from + k) % screen_width;
                self.draw_column(ctx, x, ring_col);
            }
            self.draw_playhead_marker(ctx, marker_x);
            self.playhead = marker_x;
        } else {
            return false;
        }

        self.columns_filled += filled;
        if self.columns_filled > width / 2 {
            self.columns_filled = 0;
            return true;
        }
        false
    }

    /// Full-width pass anchored at `playhead`: used for scroll-back and
    /// any full-redraw request. `max_column` is the newest ring column.
    pub fn render_history(&mut self, ctx: &RenderContext<'_>, playhead: usize, max_column: usize) {
        self.full_redraw = false;
        self.redraw_all(ctx, playhead, max_column);
    }

    fn redraw_all(&mut self, ctx: &RenderContext<'_>, playhead: usize, max_column: usize) {
        let width = self.bitmap.width();
        let screen_width = ctx.columns.width();
        self.bitmap.clear_all(ctx.scheme.background);
        for x in 0..width {
            let ring_col =
                scrollback::history_column(x, playhead, width, max_column, screen_width);
            self.draw_column(ctx, x, ring_col);
        }
        if playhead < width.saturating_sub(1) {
            self.draw_playhead_marker(ctx, playhead);
        }
    }

    fn draw_playhead_marker(&mut self, ctx: &RenderContext<'_>, x: usize) {
        let premult = ctx.scheme.playhead.premultiply();
        let mut y = 0i32;
        while y < self.bitmap.height() as i32 {
            self.bitmap.set(x as i32, y, premult);
            y += 2;
        }
    }

    /// Draw one column of every visible channel: zero line, selection
    /// ticks, event overlays, the trace segment and warning markers.
    fn draw_column(&mut self, ctx: &RenderContext<'_>, x: usize, ring_col: usize) {
        let xi = x as i32;
        let ch_height = ctx.config.channel_height as i32;
        let height_f = ctx.config.channel_height as f32;
        let zero = ctx.scheme.zero_line.premultiply();
        let ticks = ctx.scheme.range_ticks.premultiply();
        let event_bits = ctx.columns.event(ring_col) as u32;

        let mut slot = 0i32;
        for channel in ctx.channels.iter().filter(|c| c.enabled) {
            let y0 = slot * ch_height;
            slot += 1;

            if let Some((top, bottom)) = ctx.viewport {
                if y0 + ch_height < top as i32 || y0 > bottom as i32 {
                    continue;
                }
            }

            let center = y0 + ch_height / 2;
            self.bitmap.set(xi, center, zero);

            if channel.selected {
                let jump = (ch_height / 4).max(1);
                let mut m = y0;
                while m <= y0 + jump * 4 {
                    self.bitmap.set(xi, m, ticks);
                    m += jump;
                }
            }

            for line in 0..EVENT_LINES {
                if ctx.config.event_display[line] && event_bits & (1 << line) != 0 {
                    for y in y0..y0 + ch_height {
                        self.bitmap
                            .blend(xi, y, ctx.scheme.event_colours[line], EVENT_OVERLAY_ALPHA);
                    }
                }
            }

            let range = channel.range.max(f32::EPSILON);
            let sign = if channel.inverted { -1.0 } else { 1.0 };
            let raw_max = ctx.columns.max(channel.index, ring_col);
            let raw_min = ctx.columns.min(channel.index, ring_col);
            let raw_mean = ctx.columns.mean(channel.index, ring_col);

            let mut a = raw_max * sign / range * height_f;
            let mut b = raw_min * sign / range * height_f;
            let mut mean_px = raw_mean * sign / range * height_f;
            if ctx.config.median_offset {
                let offset = ctx.stats.mean(channel.index) * sign / range * height_f;
                a -= offset;
                b -= offset;
                mean_px -= offset;
            }

            let (mut from, mut to) = if a < b { (a, b) } else { (b, a) };

            // Clip the trace to the allowed overlap region.
            let lm = (height_f * ctx.config.overlap_factor).abs();
            let mut clip_hi = false;
            let mut clip_lo = false;
            if to > lm {
                to = lm;
                clip_hi = true;
            }
            if from > lm {
                from = lm;
                clip_hi = true;
            }
            if from < -lm {
                from = -lm;
                clip_lo = true;
            }
            if to < -lm {
                to = -lm;
                clip_lo = true;
            }

            let threshold = ctx.config.saturation_threshold;
            let saturated = ctx.config.saturation_warning
                && (raw_max.abs() > threshold || raw_min.abs() > threshold);

            let (bright, dark) = ctx.scheme.line_pair(channel.index);
            let info = ColumnInfo {
                channel: channel.index,
                x,
                y_origin: y0,
                from: center + from.round() as i32,
                to: center + to.round() as i32,
                mean: center + mean_px.round() as i32,
                bright: bright.premultiply(),
                dark: dark.premultiply(),
            };
            ctx.plotter.plot(&mut self.bitmap, &info);

            if ctx.config.clip_warning {
                let marker = ctx.scheme.clip_marker.premultiply();
                if clip_hi {
                    let edge = center + lm as i32;
                    for j in 0..=3 {
                        self.bitmap.set(xi, edge - j, marker);
                    }
                }
                if clip_lo {
                    let edge = center - lm as i32;
                    for j in 0..=3 {
                        self.bitmap.set(xi, edge + j, marker);
                    }
                }
            }

            if saturated {
                let (warn_a, warn_b) = ctx.scheme.saturation_warning;
                for y in y0..y0 + ch_height {
                    let colour = if (xi + y) % SATURATION_PATTERN > SATURATION_PATTERN / 2 {
                        warn_b
                    } else {
                        warn_a
                    };
                    self.bitmap.set(xi, y, colour.premultiply());
                }
            }
        }
    }
}
