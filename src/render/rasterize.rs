//! Point binning and shading.
//!
//! Points are accumulated into a `width × height` grid aligned with the viewport, shaded through
//! the [`ColorMapping`], and optionally dilated into disks so sparse points stay visible.

use std::collections::BTreeMap;

use crate::data::point::Point;
use crate::foundation::color::Rgba8;
use crate::foundation::error::{MotionError, MotionResult};
use crate::foundation::math::mul_div255_u8;
use crate::render::colormap::{ColorMapping, sample_palette};
use crate::render::raster::Raster;
use crate::scene::viewport::ViewportSpec;

/// Alpha of the sparsest occupied bin under a continuous mapping; the densest bin is opaque.
pub const MIN_ALPHA: u8 = 40;

/// Largest accepted `point_radius_px`.
pub const MAX_POINT_RADIUS_PX: u32 = 256;

/// Rasterize `points` into a raster of exactly the viewport's pixel size.
///
/// Points outside the extent, with non-finite coordinates or weights, or (for categorical
/// mappings) without a mapped category are dropped. Empty bins stay fully transparent.
pub fn rasterize(
    points: &[Point],
    viewport: &ViewportSpec,
    mapping: &ColorMapping,
    point_radius_px: u32,
) -> MotionResult<Raster> {
    mapping.validate()?;
    validate_point_radius(point_radius_px)?;
    let width = viewport.width_px();
    let height = viewport.height_px();

    let colored = match mapping {
        ColorMapping::Continuous(palette) => shade_continuous(points, viewport, palette),
        ColorMapping::Categorical(categories) => shade_categorical(points, viewport, categories),
    };

    let mut raster = Raster::transparent(width, height);
    // A disk wider than the raster diagonal paints nothing more.
    let diagonal = f64::from(width).hypot(f64::from(height)).ceil() as u32;
    let disk = disk_offsets(point_radius_px.min(diagonal));
    for (bin, color) in colored {
        let cx = (bin % width as usize) as i64;
        let cy = (bin / width as usize) as i64;
        let px = color.to_premul();
        for &(dx, dy) in &disk {
            let (x, y) = (cx + dx, cy + dy);
            if x < 0 || y < 0 {
                continue;
            }
            raster.put_pixel(x as u32, y as u32, px);
        }
    }
    Ok(raster)
}

pub(crate) fn validate_point_radius(radius: u32) -> MotionResult<()> {
    if radius > MAX_POINT_RADIUS_PX {
        return Err(MotionError::validation(format!(
            "point_radius_px {radius} exceeds the maximum of {MAX_POINT_RADIUS_PX}"
        )));
    }
    Ok(())
}

fn bin_index(viewport: &ViewportSpec, p: &Point) -> Option<usize> {
    let (col, row) = viewport.bin_of(p.lon, p.lat)?;
    Some((row as usize) * (viewport.width_px() as usize) + col as usize)
}

/// Colored bins in paint order: ascending equalized intensity, ties by bin index.
///
/// Both the palette position and the alpha follow the equalized level; alpha ramps from
/// [`MIN_ALPHA`] to the palette color's own alpha.
fn shade_continuous(
    points: &[Point],
    viewport: &ViewportSpec,
    palette: &[Rgba8],
) -> Vec<(usize, Rgba8)> {
    let mut bins: BTreeMap<usize, f64> = BTreeMap::new();
    for p in points {
        let w = p.weight.unwrap_or(1.0);
        if !w.is_finite() {
            continue;
        }
        if let Some(bin) = bin_index(viewport, p) {
            *bins.entry(bin).or_insert(0.0) += w;
        }
    }
    if bins.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<f64> = bins.values().copied().collect();
    sorted.sort_by(f64::total_cmp);
    let levels = equalize(&sorted);

    let mut out: Vec<(usize, f64)> = bins.into_iter().collect();
    out.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    out.into_iter()
        .map(|(bin, v)| {
            let t = levels(v);
            (bin, ramp_alpha(sample_palette(palette, t), t))
        })
        .collect()
}

fn ramp_alpha(color: Rgba8, t: f64) -> Rgba8 {
    let span = f64::from(u8::MAX - MIN_ALPHA);
    let ramp = (f64::from(MIN_ALPHA) + span * t.clamp(0.0, 1.0)).round() as u16;
    Rgba8 {
        a: mul_div255_u8(u16::from(color.a), ramp),
        ..color
    }
}

/// Histogram equalization over occupied bins.
///
/// Returns a mapping from bin value to `[0, 1]`: the empirical CDF rescaled so the smallest
/// value maps to 0 and the largest to 1. A single distinct value maps to 1.
fn equalize(sorted: &[f64]) -> impl Fn(f64) -> f64 + '_ {
    let n = sorted.len() as f64;
    let cdf = move |v: f64| sorted.partition_point(|x| *x <= v) as f64 / n;
    let cdf_min = sorted.first().map_or(1.0, |&v| cdf(v));
    move |v: f64| {
        let span = 1.0 - cdf_min;
        if span <= f64::EPSILON {
            return 1.0;
        }
        ((cdf(v) - cdf_min) / span).clamp(0.0, 1.0)
    }
}

#[derive(Debug)]
struct CategoryBin {
    counts: Vec<u32>,
    winner: usize,
}

/// Colored bins in bin order; each bin takes its most frequent category, ties to the latest.
fn shade_categorical(
    points: &[Point],
    viewport: &ViewportSpec,
    categories: &BTreeMap<String, Rgba8>,
) -> Vec<(usize, Rgba8)> {
    let colors: Vec<Rgba8> = categories.values().copied().collect();
    let mut bins: BTreeMap<usize, CategoryBin> = BTreeMap::new();
    let mut unmapped = 0usize;

    for p in points {
        let Some(cat) = p
            .category
            .as_deref()
            .and_then(|c| categories.keys().position(|k| k == c))
        else {
            unmapped += 1;
            continue;
        };
        let Some(bin) = bin_index(viewport, p) else {
            continue;
        };
        let entry = bins.entry(bin).or_insert_with(|| CategoryBin {
            counts: vec![0; colors.len()],
            winner: cat,
        });
        entry.counts[cat] += 1;
        if entry.counts[cat] >= entry.counts[entry.winner] {
            entry.winner = cat;
        }
    }

    if unmapped > 0 {
        tracing::debug!(unmapped, "dropped points without a mapped category");
    }

    bins.into_iter()
        .map(|(bin, b)| (bin, colors[b.winner]))
        .collect()
}

fn disk_offsets(radius: u32) -> Vec<(i64, i64)> {
    let r = i64::from(radius);
    let mut out = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                out.push((dx, dy));
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/rasterize.rs"]
mod tests;
