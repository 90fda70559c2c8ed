//! Per-view colour definitions.
//!
//! Every view owns its own `ColorScheme`; nothing here is shared or static,
//! so two split views can use different schemes without interfering.

use tiny_skia::ColorU8;

const fn c(r: u8, g: u8, b: u8) -> ColorU8 {
    ColorU8::from_rgba(r, g, b, 255)
}

/// Colours used by the bitmap renderer for one view.
#[derive(Clone, Debug)]
pub struct ColorScheme {
    /// Bitmap background.
    pub background: ColorU8,
    /// Trace colours, cycled by channel index.
    pub channel_colours: Vec<ColorU8>,
    /// Overlay colours for the 8 TTL event lines.
    pub event_colours: [ColorU8; crate::source::EVENT_LINES],
    /// Zero-line tick.
    pub zero_line: ColorU8,
    /// Range tick marks on a selected channel.
    pub range_ticks: ColorU8,
    /// Most-recently-written-column marker.
    pub playhead: ColorU8,
    /// Marker drawn where the trace was clipped to its band.
    pub clip_marker: ColorU8,
    /// Alternating colours of the saturation warning pattern.
    pub saturation_warning: (ColorU8, ColorU8),
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            background: c(18, 18, 20),
            channel_colours: vec![
                c(224, 185, 36),
                c(214, 210, 182),
                c(243, 119, 62),
                c(186, 157, 168),
                c(237, 37, 36),
                c(179, 122, 79),
                c(217, 46, 171),
                c(217, 139, 196),
                c(101, 31, 255),
                c(141, 111, 181),
                c(48, 117, 255),
                c(184, 198, 224),
                c(116, 227, 156),
                c(150, 158, 155),
                c(82, 173, 0),
                c(125, 99, 32),
            ],
            event_colours: [
                c(224, 185, 36),
                c(243, 119, 62),
                c(237, 37, 36),
                c(217, 46, 171),
                c(101, 31, 255),
                c(48, 117, 255),
                c(116, 227, 156),
                c(82, 173, 0),
            ],
            zero_line: c(50, 50, 50),
            range_ticks: c(80, 80, 80),
            playhead: c(255, 230, 0),
            clip_marker: c(255, 255, 255),
            saturation_warning: (c(255, 0, 0), c(255, 255, 255)),
        }
    }
}

impl ColorScheme {
    /// Trace colour for a channel (palette cycles).
    pub fn channel_colour(&self, channel: usize) -> ColorU8 {
        self.channel_colours[channel % self.channel_colours.len()]
    }

    /// Bright/dark endpoint pair for the column plotters, derived from the
    /// channel's trace colour.
    pub fn line_pair(&self, channel: usize) -> (ColorU8, ColorU8) {
        let base = self.channel_colour(channel);
        let bright = scale(base, 1.3);
        let dark = scale(base, 0.3);
        (bright, dark)
    }
}

fn scale(colour: ColorU8, factor: f32) -> ColorU8 {
    let s = |v: u8| ((v as f32 * factor).round().clamp(0.0, 255.0)) as u8;
    ColorU8::from_rgba(s(colour.red()), s(colour.green()), s(colour.blue()), colour.alpha())
}
