use crate::foundation::error::{MotionError, MotionResult};

/// Geographic extent (EPSG:4326) and pixel resolution rendered into every frame.
///
/// Construction validates the bounds; the value is immutable afterwards and shared read-only
/// by every stage of a render.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportSpec {
    min_lon: f64,
    max_lon: f64,
    min_lat: f64,
    max_lat: f64,
    width_px: u32,
    height_px: u32,
}

impl ViewportSpec {
    /// Create a validated viewport.
    ///
    /// Requires finite bounds with `min_lon < max_lon`, `min_lat < max_lat`, and non-zero pixel
    /// dimensions.
    pub fn new(
        min_lon: f64,
        max_lon: f64,
        min_lat: f64,
        max_lat: f64,
        width_px: u32,
        height_px: u32,
    ) -> MotionResult<Self> {
        if ![min_lon, max_lon, min_lat, max_lat]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(MotionError::validation("viewport bounds must be finite"));
        }
        if min_lon >= max_lon {
            return Err(MotionError::validation(format!(
                "viewport min_lon ({min_lon}) must be < max_lon ({max_lon})"
            )));
        }
        if min_lat >= max_lat {
            return Err(MotionError::validation(format!(
                "viewport min_lat ({min_lat}) must be < max_lat ({max_lat})"
            )));
        }
        if width_px == 0 || height_px == 0 {
            return Err(MotionError::validation(
                "viewport width_px/height_px must be non-zero",
            ));
        }
        Ok(Self {
            min_lon,
            max_lon,
            min_lat,
            max_lat,
            width_px,
            height_px,
        })
    }

    /// Western bound.
    pub fn min_lon(&self) -> f64 {
        self.min_lon
    }

    /// Eastern bound.
    pub fn max_lon(&self) -> f64 {
        self.max_lon
    }

    /// Southern bound.
    pub fn min_lat(&self) -> f64 {
        self.min_lat
    }

    /// Northern bound.
    pub fn max_lat(&self) -> f64 {
        self.max_lat
    }

    /// Output width in pixels.
    pub fn width_px(&self) -> u32 {
        self.width_px
    }

    /// Output height in pixels.
    pub fn height_px(&self) -> u32 {
        self.height_px
    }

    /// Longitude midpoint.
    pub fn center_lon(&self) -> f64 {
        (self.min_lon + self.max_lon) / 2.0
    }

    /// Latitude midpoint.
    pub fn center_lat(&self) -> f64 {
        (self.min_lat + self.max_lat) / 2.0
    }

    /// Bounding box as `(min_lon, min_lat, max_lon, max_lat)`.
    pub fn bbox(&self) -> (f64, f64, f64, f64) {
        (self.min_lon, self.min_lat, self.max_lon, self.max_lat)
    }

    /// Return `true` when the coordinate lies inside the extent (edges included).
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        (self.min_lon..=self.max_lon).contains(&lon) && (self.min_lat..=self.max_lat).contains(&lat)
    }

    /// Map a coordinate to its `(column, row)` pixel bin, north up.
    ///
    /// Points on the eastern or southern edge fold into the last column or row. Returns
    /// `None` outside the extent or for non-finite input.
    pub fn bin_of(&self, lon: f64, lat: f64) -> Option<(u32, u32)> {
        if !lon.is_finite() || !lat.is_finite() || !self.contains(lon, lat) {
            return None;
        }
        let fx = (lon - self.min_lon) / (self.max_lon - self.min_lon);
        let fy = (self.max_lat - lat) / (self.max_lat - self.min_lat);
        let col = ((fx * f64::from(self.width_px)).floor() as u32).min(self.width_px - 1);
        let row = ((fy * f64::from(self.height_px)).floor() as u32).min(self.height_px - 1);
        Some((col, row))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/viewport.rs"]
mod tests;
