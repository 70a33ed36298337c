use std::sync::Arc;

use chrono::{DateTime, Utc};

/// One geospatial observation.
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    /// Observation time.
    pub timestamp: DateTime<Utc>,
    /// Longitude in degrees (EPSG:4326).
    pub lon: f64,
    /// Latitude in degrees (EPSG:4326).
    pub lat: f64,
    /// Category label, used by categorical color mappings.
    pub category: Option<Arc<str>>,
    /// Intensity contributed to continuous aggregation; `None` counts as 1.
    pub weight: Option<f64>,
}

impl Point {
    /// Uncategorized, unweighted point.
    pub fn new(timestamp: DateTime<Utc>, lon: f64, lat: f64) -> Self {
        Self {
            timestamp,
            lon,
            lat,
            category: None,
            weight: None,
        }
    }

    /// Attach a category label.
    pub fn with_category(mut self, category: impl Into<Arc<str>>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Attach a weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }
}
