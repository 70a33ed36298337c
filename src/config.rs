//! JSON render configuration.
//!
//! A [`RenderConfig`] describes everything a render needs except the points themselves:
//!
//! ```json
//! {
//!   "viewport": { "min_lon": -74.26, "max_lon": -73.70, "min_lat": 40.48, "max_lat": 40.92,
//!                 "width_px": 1920, "height_px": 1080 },
//!   "playback": { "start": "2016-01-01T00:00:00Z", "end": "2016-01-02T00:00:00Z",
//!                 "frame_length_secs": 3600, "frame_step_secs": 900, "frame_rate": 10 },
//!   "basemap": { "type": "wms", "url": "https://ows.example.org/service", "layer": "OSM-WMS" },
//!   "palette": ["#000000", "#ff0000", "#ffffff"],
//!   "point_radius_px": 1
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::assets::basemap::{BasemapProvider, FileBasemap, SolidBasemap, WmsBasemap};
use crate::assets::fonts::FontSpec;
use crate::data::csv::CsvColumns;
use crate::foundation::color::Rgba8;
use crate::foundation::error::{MotionError, MotionResult};
use crate::pipeline::motion::{RenderOptions, RenderThreading};
use crate::render::colormap::ColorMapping;
use crate::render::overlay::{DEFAULT_DATE_FORMAT, FrameAnnotation, FrameWatermark};
use crate::scene::playback::PlaybackSpec;
use crate::scene::viewport::ViewportSpec;

/// Top-level render configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    /// Geographic extent and output size.
    pub viewport: ViewportConfig,
    /// Temporal range and frame timing.
    pub playback: PlaybackConfig,
    /// Background source.
    #[serde(default)]
    pub basemap: BasemapConfig,
    /// Continuous palette (hex colors). Mutually exclusive with `categories`.
    #[serde(default)]
    pub palette: Option<Vec<Rgba8>>,
    /// Category to color map. Mutually exclusive with `palette`.
    #[serde(default)]
    pub categories: Option<BTreeMap<String, Rgba8>>,
    /// Disk radius around each colored bin.
    #[serde(default)]
    pub point_radius_px: u32,
    /// Optional time/center label.
    #[serde(default)]
    pub annotation: Option<AnnotationConfig>,
    /// Optional static text.
    #[serde(default)]
    pub watermark: Option<WatermarkConfig>,
    /// Frame threading.
    #[serde(default)]
    pub threading: RenderThreading,
    /// Encoder flatten color.
    #[serde(default = "default_background")]
    pub background: Rgba8,
    /// CSV column names for point input.
    #[serde(default)]
    pub columns: CsvColumns,
    /// Number of dataset partitions scanned in parallel per window.
    #[serde(default = "default_partitions")]
    pub partitions: usize,
}

/// Viewport section.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewportConfig {
    /// West edge in degrees.
    pub min_lon: f64,
    /// East edge in degrees.
    pub max_lon: f64,
    /// South edge in degrees.
    pub min_lat: f64,
    /// North edge in degrees.
    pub max_lat: f64,
    /// Output width in pixels.
    pub width_px: u32,
    /// Output height in pixels.
    pub height_px: u32,
}

/// Playback section; durations are in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaybackConfig {
    /// First window start (RFC 3339).
    pub start: DateTime<Utc>,
    /// Playback end; window ends are clamped to it.
    pub end: DateTime<Utc>,
    /// Window length.
    pub frame_length_secs: f64,
    /// Offset between consecutive window starts.
    pub frame_step_secs: f64,
    /// Output frames per second.
    pub frame_rate: u32,
}

/// Basemap section, tagged by `type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum BasemapConfig {
    /// WMS 1.3.0 GetMap service.
    Wms {
        /// Service endpoint, without GetMap parameters.
        url: String,
        /// Layer name passed as `LAYERS`.
        layer: String,
        /// Request timeout.
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    /// Local image file.
    File {
        /// PNG, JPEG or GIF file; resized to the viewport when needed.
        path: PathBuf,
    },
    /// Flat color.
    Solid {
        /// Fill color.
        color: Rgba8,
    },
}

impl Default for BasemapConfig {
    fn default() -> Self {
        Self::Solid {
            color: Rgba8::WHITE,
        }
    }
}

/// Annotation section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnnotationConfig {
    /// Left edge of the label in pixels.
    pub x: i32,
    /// Top edge of the label in pixels.
    pub y: i32,
    /// Label font.
    pub font: FontSpec,
    /// Text color; white by default.
    #[serde(default = "default_text_color")]
    pub color: Rgba8,
    /// Write the center as `(lon, lat)` instead of `(lat, lon)`.
    #[serde(default = "default_true")]
    pub lon_lat: bool,
    /// strftime layout for the window bounds.
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

/// Watermark section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatermarkConfig {
    /// Text drawn on every frame.
    pub text: String,
    /// Left edge of the text in pixels.
    pub x: i32,
    /// Top edge of the text in pixels.
    pub y: i32,
    /// Watermark font.
    pub font: FontSpec,
    /// Text color; white by default.
    #[serde(default = "default_text_color")]
    pub color: Rgba8,
}

fn default_background() -> Rgba8 {
    Rgba8::BLACK
}

fn default_partitions() -> usize {
    1
}

fn default_timeout_secs() -> u64 {
    WmsBasemap::DEFAULT_TIMEOUT.as_secs()
}

fn default_text_color() -> Rgba8 {
    Rgba8::WHITE
}

fn default_true() -> bool {
    true
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_owned()
}

/// Validated specs and options built from a [`RenderConfig`].
pub struct RenderPlan {
    /// Validated viewport.
    pub viewport: ViewportSpec,
    /// Validated playback.
    pub playback: PlaybackSpec,
    /// Basemap source for the render.
    pub basemap: Box<dyn BasemapProvider>,
    /// Coloring, overlays and threading.
    pub options: RenderOptions,
}

impl std::fmt::Debug for RenderPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPlan")
            .field("viewport", &self.viewport)
            .field("playback", &self.playback)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl RenderConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(s: &str) -> MotionResult<Self> {
        serde_json::from_str(s).map_err(|e| MotionError::config(format!("invalid config: {e}")))
    }

    /// Read and parse a JSON configuration file.
    pub fn from_path(path: &Path) -> MotionResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        serde_json::from_str(&text)
            .map_err(|e| MotionError::config(format!("{}: {e}", path.display())))
    }

    /// Turn the configuration into validated specs, a basemap provider and render options.
    pub fn build(&self) -> MotionResult<RenderPlan> {
        let v = &self.viewport;
        let viewport = ViewportSpec::new(
            v.min_lon,
            v.max_lon,
            v.min_lat,
            v.max_lat,
            v.width_px,
            v.height_px,
        )
        .map_err(|e| MotionError::config(format!("viewport: {e}")))?;

        let p = &self.playback;
        let playback = PlaybackSpec::new(
            p.start,
            p.end,
            seconds("frame_length_secs", p.frame_length_secs)?,
            seconds("frame_step_secs", p.frame_step_secs)?,
            p.frame_rate,
        )
        .map_err(|e| MotionError::config(format!("playback: {e}")))?;

        let basemap: Box<dyn BasemapProvider> = match &self.basemap {
            BasemapConfig::Wms {
                url,
                layer,
                timeout_secs,
            } => Box::new(WmsBasemap::with_timeout(
                url.clone(),
                layer.clone(),
                Duration::from_secs(*timeout_secs),
            )?),
            BasemapConfig::File { path } => Box::new(FileBasemap::new(path.clone())),
            BasemapConfig::Solid { color } => Box::new(SolidBasemap::new(*color)),
        };

        let color_mapping = match (&self.palette, &self.categories) {
            (Some(_), Some(_)) => {
                return Err(MotionError::config(
                    "'palette' and 'categories' are mutually exclusive",
                ));
            }
            (Some(palette), None) => ColorMapping::Continuous(palette.clone()),
            (None, Some(categories)) => ColorMapping::Categorical(categories.clone()),
            (None, None) => ColorMapping::fire(),
        };
        color_mapping
            .validate()
            .map_err(|e| MotionError::config(format!("color mapping: {e}")))?;

        if self.partitions == 0 {
            return Err(MotionError::config("'partitions' must be >= 1"));
        }

        let annotation = self
            .annotation
            .as_ref()
            .map(|a| {
                FrameAnnotation::new(
                    a.x,
                    a.y,
                    a.font.clone(),
                    a.color,
                    a.lon_lat,
                    a.date_format.clone(),
                )
            })
            .transpose()
            .map_err(|e| MotionError::config(format!("annotation: {e}")))?;
        let watermark = self
            .watermark
            .as_ref()
            .map(|w| FrameWatermark::new(w.text.clone(), w.x, w.y, w.font.clone(), w.color))
            .transpose()
            .map_err(|e| MotionError::config(format!("watermark: {e}")))?;

        let options = RenderOptions {
            color_mapping,
            point_radius_px: self.point_radius_px,
            annotation,
            watermark,
            threading: self.threading.clone(),
            cancel: None,
            background: self.background,
        };
        options
            .validate()
            .map_err(|e| MotionError::config(format!("options: {e}")))?;

        Ok(RenderPlan {
            viewport,
            playback,
            basemap,
            options,
        })
    }
}

fn seconds(field: &str, secs: f64) -> MotionResult<TimeDelta> {
    if !secs.is_finite() || secs.abs() > 1e12 {
        return Err(MotionError::config(format!(
            "'{field}' must be a finite number of seconds"
        )));
    }
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9).round() as i64;
    Ok(TimeDelta::seconds(whole) + TimeDelta::nanoseconds(nanos))
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
