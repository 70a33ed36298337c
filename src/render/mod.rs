//! Per-frame raster work.
//!
//! All rasters are premultiplied RGBA8; straight alpha only appears at encoder boundaries.

/// Point-to-color mappings.
pub mod colormap;
/// Premultiplied pixel compositing.
pub mod composite;
/// Frame layering over the basemap.
pub mod compositor;
/// Text overlays.
pub mod overlay;
/// Premultiplied RGBA8 raster.
pub mod raster;
/// Point binning and shading.
pub mod rasterize;
