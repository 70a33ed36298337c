//! motionshader renders animated playback of geospatial point data.
//!
//! A render walks a [`PlaybackSpec`] window by window: each window's points are pulled from a
//! [`WindowedDataSource`], binned and shaded into a raster the size of the [`ViewportSpec`],
//! composited over a basemap fetched once per render, optionally labelled, and appended to a
//! [`FrameSink`] (looping GIF, MP4 through the system `ffmpeg`, or in memory).
//!
//! - Build a [`PointDataset`] (directly or from CSV)
//! - Create a [`MotionVideo`] with a [`BasemapProvider`]
//! - Call [`MotionVideo::to_gif`], [`MotionVideo::to_video`] or [`MotionVideo::render`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Basemap providers, image decoding and font loading.
pub mod assets;
/// JSON render configuration.
pub mod config;
/// Points and windowed data sources.
pub mod data;
/// Frame sinks.
pub mod encode;
mod foundation;
/// Render orchestration.
pub mod pipeline;
/// Rasterization, compositing and text overlays.
pub mod render;
/// Viewport and playback value types.
pub mod scene;

pub use crate::foundation::color::Rgba8;
pub use crate::foundation::error::{MotionError, MotionResult};

pub use crate::assets::basemap::{BasemapProvider, FileBasemap, SolidBasemap, WmsBasemap};
pub use crate::assets::decode::{decode_image, save_png};
pub use crate::assets::fonts::FontSpec;
pub use crate::config::{RenderConfig, RenderPlan};
pub use crate::data::csv::CsvColumns;
pub use crate::data::dataset::{PointDataset, WindowedDataSource};
pub use crate::data::point::Point;
pub use crate::encode::ffmpeg::{Mp4Sink, is_ffmpeg_on_path};
pub use crate::encode::gif::GifSink;
pub use crate::encode::sink::{FrameSink, InMemorySink};
pub use crate::pipeline::motion::{
    CancelToken, MotionVideo, RenderOptions, RenderReport, RenderState, RenderThreading,
};
pub use crate::render::colormap::ColorMapping;
pub use crate::render::overlay::{FrameAnnotation, FrameWatermark};
pub use crate::render::raster::Raster;
pub use crate::scene::playback::{PlaybackSpec, TimeWindow};
pub use crate::scene::viewport::ViewportSpec;
