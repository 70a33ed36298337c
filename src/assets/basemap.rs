//! Background rasters fetched once per render.

use std::path::PathBuf;
use std::time::Duration;

use crate::assets::decode::decode_image_sized;
use crate::foundation::color::Rgba8;
use crate::foundation::error::{MotionError, MotionResult};
use crate::render::raster::Raster;
use crate::scene::viewport::ViewportSpec;

/// Provider of the static background shared by every frame of a render.
///
/// `fetch` is called exactly once per render, before any frame work starts. The returned raster
/// must be `viewport.width_px() × viewport.height_px()`.
pub trait BasemapProvider: Send + Sync {
    /// Produce the basemap for `viewport`.
    fn fetch(&self, viewport: &ViewportSpec) -> MotionResult<Raster>;
}

/// OGC WMS 1.3.0 `GetMap` basemap in EPSG:4326.
#[derive(Clone, Debug)]
pub struct WmsBasemap {
    client: reqwest::blocking::Client,
    url: String,
    layer: String,
}

impl WmsBasemap {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// WMS basemap for service `url` and `layer`, using a client with the default timeout.
    pub fn new(url: impl Into<String>, layer: impl Into<String>) -> MotionResult<Self> {
        Self::with_timeout(url, layer, Self::DEFAULT_TIMEOUT)
    }

    /// WMS basemap with an explicit request timeout.
    pub fn with_timeout(
        url: impl Into<String>,
        layer: impl Into<String>,
        timeout: Duration,
    ) -> MotionResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("motionshader/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MotionError::tile_fetch(format!("failed to build http client: {e}")))?;
        Ok(Self::with_client(client, url, layer))
    }

    /// WMS basemap using a caller-configured client (authentication, proxies, TLS).
    pub fn with_client(
        client: reqwest::blocking::Client,
        url: impl Into<String>,
        layer: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            layer: layer.into(),
        }
    }

    /// The `GetMap` request URL for `viewport`.
    ///
    /// WMS 1.3.0 with EPSG:4326 uses latitude-first axis order in `bbox`.
    pub fn request_url(&self, viewport: &ViewportSpec) -> MotionResult<reqwest::Url> {
        let (min_lon, min_lat, max_lon, max_lat) = viewport.bbox();
        let mut url = reqwest::Url::parse(&self.url).map_err(|e| {
            MotionError::tile_fetch(format!("invalid basemap url '{}': {e}", self.url))
        })?;
        url.query_pairs_mut()
            .append_pair("bbox", &format!("{min_lat},{min_lon},{max_lat},{max_lon}"))
            .append_pair("width", &viewport.width_px().to_string())
            .append_pair("height", &viewport.height_px().to_string())
            .append_pair("layers", &self.layer)
            .append_pair("format", "image/png")
            .append_pair("service", "WMS")
            .append_pair("version", "1.3.0")
            .append_pair("crs", "EPSG:4326")
            .append_pair("request", "GetMap")
            .append_pair("styles", "");
        Ok(url)
    }
}

impl BasemapProvider for WmsBasemap {
    #[tracing::instrument(skip(self), fields(layer = %self.layer))]
    fn fetch(&self, viewport: &ViewportSpec) -> MotionResult<Raster> {
        let url = self.request_url(viewport)?;
        tracing::info!(%url, "fetching basemap");

        let resp = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| MotionError::tile_fetch(format!("GET {url} failed: {e}")))?;
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_owned();
        let body = resp.bytes().map_err(|e| {
            MotionError::tile_fetch(format!("reading basemap response from {url} failed: {e}"))
        })?;

        if !status.is_success() {
            return Err(MotionError::tile_fetch(format!(
                "GET {url} returned {status}: {}",
                snippet(&body)
            )));
        }

        decode_image_sized(&body, viewport.width_px(), viewport.height_px()).map_err(|e| {
            MotionError::tile_fetch(format!(
                "basemap payload ({content_type}) is not a decodable image: {e}; body starts with: {}",
                snippet(&body)
            ))
        })
    }
}

fn snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(&body[..body.len().min(200)]);
    text.trim().to_owned()
}

/// Basemap decoded from a local image file (resized to the viewport when needed).
#[derive(Clone, Debug)]
pub struct FileBasemap {
    /// Image path.
    pub path: PathBuf,
}

impl FileBasemap {
    /// Basemap read from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BasemapProvider for FileBasemap {
    fn fetch(&self, viewport: &ViewportSpec) -> MotionResult<Raster> {
        let bytes = std::fs::read(&self.path).map_err(|e| {
            MotionError::tile_fetch(format!("read basemap '{}': {e}", self.path.display()))
        })?;
        decode_image_sized(&bytes, viewport.width_px(), viewport.height_px()).map_err(|e| {
            MotionError::tile_fetch(format!("decode basemap '{}': {e}", self.path.display()))
        })
    }
}

/// Flat single-color basemap.
#[derive(Clone, Copy, Debug)]
pub struct SolidBasemap {
    /// Fill color.
    pub color: Rgba8,
}

impl SolidBasemap {
    /// Basemap filled with `color`.
    pub fn new(color: Rgba8) -> Self {
        Self { color }
    }
}

impl BasemapProvider for SolidBasemap {
    fn fetch(&self, viewport: &ViewportSpec) -> MotionResult<Raster> {
        Ok(Raster::solid(
            viewport.width_px(),
            viewport.height_px(),
            self.color,
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/basemap.rs"]
mod tests;
