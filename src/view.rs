//! One split view: the whole pipeline from source samples to bitmap.
//!
//! A `ScopeView` owns its configuration, channel metadata, aggregator,
//! trigger state, renderer and scroll-back controller, and is driven by a
//! single `refresh()` call from the UI timer (~every 20 ms). Nothing in
//! `refresh` blocks or fails; see the module docs of `aggregate` and
//! `render` for how anomalies are absorbed.

use std::sync::Arc;

use crate::aggregate::PixelAggregator;
use crate::channels::{default_channels, Channel};
use crate::color_scheme::ColorScheme;
use crate::config::{DrawMethod, ViewConfig};
use crate::controllers::ViewController;
use crate::error::{Result, ScopeError};
use crate::plotters::{ColumnPlotter, PerPixelPlotter, SupersampledPlotter};
use crate::render::{BitmapRenderer, RenderContext};
use crate::scrollback::ScrollbackController;
use crate::source::SourceBuffer;
use crate::stats::ChannelStats;
use crate::trigger::{TriggerController, TriggerPhase, TriggerPolarity};

pub struct ScopeView {
    id: usize,
    source: Arc<SourceBuffer>,
    config: ViewConfig,
    scheme: ColorScheme,
    channels: Vec<Channel>,
    aggregator: PixelAggregator,
    trigger: TriggerController,
    renderer: BitmapRenderer,
    scrollback: ScrollbackController,
    stats: ChannelStats,
    controller: Option<ViewController>,
    viewport: Option<(usize, usize)>,
}

impl ScopeView {
    /// Create a view over `source`. Fails with [`ScopeError::NoSource`]
    /// when the stream carries no channels; the caller shows a "no data"
    /// state instead of polling.
    pub fn new(id: usize, source: Arc<SourceBuffer>, config: ViewConfig) -> Result<Self> {
        if source.num_channels() == 0 {
            return Err(ScopeError::NoSource);
        }
        let channels = default_channels(source.num_channels(), source.sample_rate());
        let mut aggregator = PixelAggregator::new(channels.len(), config.display_width);
        aggregator.sync(&source);
        let height = channels.len() * config.channel_height;
        let stats = ChannelStats::new(channels.len());
        Ok(Self {
            id,
            renderer: BitmapRenderer::new(config.display_width, height),
            source,
            config,
            scheme: ColorScheme::default(),
            channels,
            aggregator,
            trigger: TriggerController::new(id),
            scrollback: ScrollbackController::new(),
            stats,
            controller: None,
            viewport: None,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn color_scheme(&self) -> &ColorScheme {
        &self.scheme
    }

    /// Replace the colour scheme; the next poll redraws everything.
    pub fn set_color_scheme(&mut self, scheme: ColorScheme) {
        self.scheme = scheme;
        self.renderer.request_full_redraw();
    }

    /// Attach an external control handle (pause/redraw requests).
    pub fn attach_controller(&mut self, controller: ViewController) {
        self.controller = Some(controller);
    }

    // ── Poll cycle ───────────────────────────────────────────────────────

    /// Run one poll cycle: drain external requests, aggregate new samples
    /// and update the bitmap (or re-render history while paused).
    pub fn refresh(&mut self) {
        let drained = self.controller.as_ref().map(|c| c.drain());
        if let Some((pause, redraw)) = drained {
            if redraw {
                self.renderer.request_full_redraw();
            }
            if let Some(p) = pause {
                self.pause(p);
            }
        }

        if self.scrollback.is_paused() {
            if self.scrollback.take_redraw() || self.renderer.wants_full_redraw() {
                let playhead = self.scrollback.playhead();
                let max_column = self.scrollback.max_column();
                let per_pixel = PerPixelPlotter;
                let supersampled = SupersampledPlotter;
                let plotter: &dyn ColumnPlotter = match self.config.draw_method {
                    DrawMethod::PerPixel => &per_pixel,
                    DrawMethod::Supersampled => &supersampled,
                };
                let ctx = RenderContext {
                    columns: self.aggregator.columns(),
                    channels: &self.channels,
                    config: &self.config,
                    scheme: &self.scheme,
                    plotter,
                    stats: &self.stats,
                    viewport: self.viewport,
                };
                self.renderer.render_history(&ctx, playhead, max_column);
            }
            return;
        }

        let outcome = self
            .aggregator
            .poll(&self.source, &self.config, &mut self.trigger);

        let stats_due = {
            let per_pixel = PerPixelPlotter;
            let supersampled = SupersampledPlotter;
            let plotter: &dyn ColumnPlotter = match self.config.draw_method {
                DrawMethod::PerPixel => &per_pixel,
                DrawMethod::Supersampled => &supersampled,
            };
            let ctx = RenderContext {
                columns: self.aggregator.columns(),
                channels: &self.channels,
                config: &self.config,
                scheme: &self.scheme,
                plotter,
                stats: &self.stats,
                viewport: self.viewport,
            };
            self.renderer.render_live(&ctx, &outcome)
        };
        if stats_due {
            self.stats.refresh(&self.source, &self.aggregator);
        }
    }

    /// Freeze or unfreeze the display. Pausing preserves all buffer state;
    /// resuming resets the scroll offset and redraws from the live edge.
    pub fn pause(&mut self, paused: bool) {
        if paused == self.scrollback.is_paused() {
            return;
        }
        if paused {
            self.scrollback.pause(
                self.renderer.playhead(),
                self.aggregator.screen_buffer_index(0),
            );
        } else {
            self.scrollback.resume();
            self.renderer.reset_playhead();
            self.renderer.request_full_redraw();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.scrollback.is_paused()
    }

    /// Scroll the paused display; larger offsets look further back.
    pub fn set_scroll_offset(&mut self, offset: f32) {
        self.scrollback.set_offset(offset, self.config.display_width);
    }

    pub fn scroll_by(&mut self, delta: f32) {
        self.scrollback.scroll_by(delta, self.config.display_width);
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scrollback.offset()
    }

    // ── Display settings ─────────────────────────────────────────────────

    /// Change the visible time span. Restarts the sweep from the left
    /// edge; with averaging enabled the trial cycle restarts too.
    pub fn set_timebase(&mut self, timebase: f32) {
        self.config.timebase = timebase;
        if self.trigger.averaging() {
            self.trigger.reset_trials();
        }
        self.resync_display();
        if self.trigger.line().is_some() {
            self.trigger.note_reached_end();
        }
    }

    /// Select (or clear) the TTL line this view triggers on.
    pub fn set_trigger_channel(&mut self, line: Option<usize>, polarity: TriggerPolarity) {
        self.trigger.set_line(&self.source, line, polarity);
        self.resync_display();
    }

    pub fn set_averaging(&mut self, averaging: bool) {
        self.trigger.set_averaging(averaging);
    }

    pub fn set_draw_method(&mut self, method: DrawMethod) {
        self.config.draw_method = method;
        self.renderer.request_full_redraw();
    }

    pub fn set_event_display(&mut self, line: usize, enabled: bool) {
        if let Some(flag) = self.config.event_display.get_mut(line) {
            *flag = enabled;
            self.renderer.request_full_redraw();
        }
    }

    pub fn set_median_offset(&mut self, enabled: bool) {
        self.config.median_offset = enabled;
        self.renderer.request_full_redraw();
    }

    pub fn set_clip_warning(&mut self, enabled: bool) {
        self.config.clip_warning = enabled;
        self.renderer.request_full_redraw();
    }

    pub fn set_saturation_warning(&mut self, enabled: bool) {
        self.config.saturation_warning = enabled;
        self.renderer.request_full_redraw();
    }

    pub fn set_saturation_threshold(&mut self, threshold: f32) {
        self.config.saturation_threshold = threshold;
        self.renderer.request_full_redraw();
    }

    pub fn set_display_width(&mut self, width: usize) {
        if width == 0 || width == self.config.display_width {
            return;
        }
        self.config.display_width = width;
        self.aggregator.resize(self.channels.len(), width);
        self.aggregator.sync(&self.source);
        self.renderer.resize(width, self.stack_height());
    }

    pub fn set_channel_height(&mut self, height: usize) {
        if height == 0 || height == self.config.channel_height {
            return;
        }
        self.config.channel_height = height;
        self.renderer
            .resize(self.config.display_width, self.stack_height());
    }

    pub fn set_overlap_factor(&mut self, factor: f32) {
        self.config.overlap_factor = factor;
        self.renderer.request_full_redraw();
    }

    /// Crop of the channel stack currently scrolled into view.
    pub fn set_viewport(&mut self, viewport: Option<(usize, usize)>) {
        self.viewport = viewport;
        self.renderer.request_full_redraw();
    }

    // ── Channel settings ─────────────────────────────────────────────────

    pub fn set_channel_range(&mut self, channel: usize, range: f32) {
        if let Some(ch) = self.channels.get_mut(channel) {
            ch.range = range;
            self.renderer.request_full_redraw();
        }
    }

    pub fn set_channel_inverted(&mut self, channel: usize, inverted: bool) {
        if let Some(ch) = self.channels.get_mut(channel) {
            ch.inverted = inverted;
            self.renderer.request_full_redraw();
        }
    }

    /// Enable/disable a channel; the stack relayouts and redraws.
    pub fn set_channel_enabled(&mut self, channel: usize, enabled: bool) {
        let changed = match self.channels.get_mut(channel) {
            Some(ch) if ch.enabled != enabled => {
                ch.enabled = enabled;
                true
            }
            _ => false,
        };
        if changed {
            self.renderer
                .resize(self.config.display_width, self.stack_height());
        }
    }

    /// Exclusively select one channel (or none); selection draws the
    /// range tick marks.
    pub fn select_channel(&mut self, channel: Option<usize>) {
        for (i, ch) in self.channels.iter_mut().enumerate() {
            ch.selected = Some(i) == channel;
        }
        self.renderer.request_full_redraw();
    }

    /// Swap in a new source stream (channel count may differ): all
    /// consumer-side buffers are rebuilt and the trigger watch moves over.
    pub fn attach_source(&mut self, source: Arc<SourceBuffer>) -> Result<()> {
        if source.num_channels() == 0 {
            return Err(ScopeError::NoSource);
        }
        self.source
            .set_trigger(self.id, None, self.trigger.polarity());
        self.source = source;
        self.channels = default_channels(self.source.num_channels(), self.source.sample_rate());
        self.aggregator
            .resize(self.channels.len(), self.config.display_width);
        self.aggregator.sync(&self.source);
        self.stats = ChannelStats::new(self.channels.len());
        self.trigger = TriggerController::new(self.id);
        self.renderer
            .resize(self.config.display_width, self.stack_height());
        Ok(())
    }

    // ── Read accessors ───────────────────────────────────────────────────

    pub fn trigger_phase(&self) -> TriggerPhase {
        self.trigger.phase()
    }

    pub fn trigger_line(&self) -> Option<usize> {
        self.trigger.line()
    }

    pub fn trigger_polarity(&self) -> TriggerPolarity {
        self.trigger.polarity()
    }

    pub fn averaging(&self) -> bool {
        self.trigger.averaging()
    }

    /// Completed trial count (`-1` before the first trigger).
    pub fn trials(&self) -> i32 {
        self.trigger.trials()
    }

    pub fn column_min(&self, channel: usize, column: usize) -> f32 {
        self.aggregator.columns().min(channel, column)
    }

    pub fn column_mean(&self, channel: usize, column: usize) -> f32 {
        self.aggregator.columns().mean(channel, column)
    }

    pub fn column_max(&self, channel: usize, column: usize) -> f32 {
        self.aggregator.columns().max(channel, column)
    }

    /// TTL bit code aggregated into one column.
    pub fn event_state(&self, column: usize) -> u32 {
        self.aggregator.columns().event(column) as u32
    }

    pub fn screen_buffer_index(&self, lane: usize) -> usize {
        self.aggregator.screen_buffer_index(lane)
    }

    pub fn display_buffer_index(&self, lane: usize) -> usize {
        self.aggregator.display_buffer_index(lane)
    }

    pub fn screen_buffer_width(&self) -> usize {
        self.aggregator.screen_width()
    }

    /// Bitmap column the next filled pixel column lands in.
    pub fn bitmap_playhead(&self) -> usize {
        self.renderer.playhead()
    }

    pub fn channel_mean(&self, channel: usize) -> f32 {
        self.stats.mean(channel)
    }

    pub fn channel_rms(&self, channel: usize) -> f32 {
        self.stats.rms(channel)
    }

    /// Read-only view of the persistent bitmap for display.
    pub fn bitmap(&self) -> &tiny_skia::Pixmap {
        self.renderer.bitmap().pixmap()
    }

    /// Save the current bitmap as PNG.
    #[cfg(feature = "snapshot")]
    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let pixmap = self.renderer.bitmap().pixmap();
        let (w, h) = (pixmap.width(), pixmap.height());
        let mut out = image::RgbaImage::new(w, h);
        for (i, pixel) in pixmap.pixels().iter().enumerate() {
            let c = pixel.demultiply();
            let (x, y) = (i as u32 % w, i as u32 / w);
            out.put_pixel(x, y, image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]));
        }
        out.save(path.as_ref())?;
        Ok(())
    }

    fn stack_height(&self) -> usize {
        let visible = self.channels.iter().filter(|c| c.enabled).count();
        (visible * self.config.channel_height).max(1)
    }

    /// Restart the sweep: re-anchor read indices at the live edge, clear
    /// the columns and redraw from the left.
    fn resync_display(&mut self) {
        self.aggregator.sync(&self.source);
        self.aggregator.reset_columns();
        self.renderer.reset_playhead();
        self.renderer.request_full_redraw();
    }
}

impl Drop for ScopeView {
    fn drop(&mut self) {
        // Release the trigger watch before the stream goes away.
        self.source
            .set_trigger(self.id, None, self.trigger.polarity());
    }
}
