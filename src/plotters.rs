//! Column plotting strategies.
//!
//! The renderer delegates the actual trace pixels of one column to a
//! [`ColumnPlotter`]. Both strategies honour the same input contract so
//! they are interchangeable at the draw call site.

use tiny_skia::PremultipliedColorU8;

use crate::render::TraceBitmap;

/// Everything a plotter needs to draw one channel's pixels in one column.
pub struct ColumnInfo {
    pub channel: usize,
    /// Bitmap column.
    pub x: usize,
    /// Top of the channel's vertical band, bitmap coordinates.
    pub y_origin: i32,
    /// Column span start (already clipped), absolute bitmap y.
    pub from: i32,
    /// Column span end (inclusive), absolute bitmap y.
    pub to: i32,
    /// Column mean, absolute bitmap y.
    pub mean: i32,
    /// Line colour at full trace density.
    pub bright: PremultipliedColorU8,
    /// Line colour at zero trace density.
    pub dark: PremultipliedColorU8,
}

/// Draws one pixel column of one channel's trace.
pub trait ColumnPlotter {
    fn plot(&self, bitmap: &mut TraceBitmap, info: &ColumnInfo);
}

/// Plain strategy: one solid vertical line from column min to max.
pub struct PerPixelPlotter;

impl ColumnPlotter for PerPixelPlotter {
    fn plot(&self, bitmap: &mut TraceBitmap, info: &ColumnInfo) {
        let (top, bottom) = span(info);
        for y in top..=bottom {
            bitmap.set(info.x as i32, y, info.bright);
        }
    }
}

/// Density strategy: approximates the sample distribution inside the
/// column with a triangular kernel around the mean and renders it as a
/// brightness gradient between the dark and bright line colours. Costs
/// more per column but reads like an anti-aliased density plot.
pub struct SupersampledPlotter;

/// Gain applied to the density estimate before mapping to brightness,
/// so thin traces stay visible.
const DENSITY_GAIN: f32 = 1.8;

impl ColumnPlotter for SupersampledPlotter {
    fn plot(&self, bitmap: &mut TraceBitmap, info: &ColumnInfo) {
        let (top, bottom) = span(info);
        if bottom == top {
            bitmap.set(info.x as i32, top, info.bright);
            return;
        }
        let half = (bottom - top) as f32 / 2.0;
        for y in top..=bottom {
            let distance = (y - info.mean).abs() as f32;
            let density = (1.0 - distance / (half + 1.0)).clamp(0.0, 1.0);
            let a = (density * DENSITY_GAIN).min(1.0);
            bitmap.set(info.x as i32, y, mix(info.dark, info.bright, a));
        }
    }
}

fn span(info: &ColumnInfo) -> (i32, i32) {
    if info.from <= info.to {
        (info.from, info.to)
    } else {
        (info.to, info.from)
    }
}

fn mix(a: PremultipliedColorU8, b: PremultipliedColorU8, t: f32) -> PremultipliedColorU8 {
    let l = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    PremultipliedColorU8::from_rgba(
        l(a.red(), b.red()),
        l(a.green(), b.green()),
        l(a.blue(), b.blue()),
        l(a.alpha(), b.alpha()),
    )
    .unwrap_or(a)
}
