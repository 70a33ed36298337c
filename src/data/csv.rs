use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::dataset::PointDataset;
use crate::data::point::Point;
use crate::foundation::error::{MotionError, MotionResult};

/// Column names used to read points from CSV.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvColumns {
    /// Timestamp column.
    pub timestamp: String,
    /// Longitude column.
    pub longitude: String,
    /// Latitude column.
    pub latitude: String,
    /// Optional category column; selects categorical rasterization when mapped.
    pub category: Option<String>,
    /// Optional weight column.
    pub weight: Option<String>,
}

impl Default for CsvColumns {
    fn default() -> Self {
        Self {
            timestamp: "timestamp".to_owned(),
            longitude: "longitude".to_owned(),
            latitude: "latitude".to_owned(),
            category: None,
            weight: None,
        }
    }
}

impl PointDataset {
    /// Read a CSV file into a dataset with `partitions` partitions.
    pub fn from_csv_path(
        path: &Path,
        columns: &CsvColumns,
        partitions: usize,
    ) -> MotionResult<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("open points csv '{}'", path.display()))?;
        Self::from_csv_reader(file, columns, partitions)
    }

    /// Read CSV records with a header row into a dataset.
    ///
    /// Empty category cells are treated as uncategorized; empty weight cells as unweighted.
    pub fn from_csv_reader<R: Read>(
        reader: R,
        columns: &CsvColumns,
        partitions: usize,
    ) -> MotionResult<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr.headers().context("read csv header")?.clone();

        let find = |name: &str| -> MotionResult<usize> {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| MotionError::config(format!("csv has no column named '{name}'")))
        };
        let ts_idx = find(&columns.timestamp)?;
        let lon_idx = find(&columns.longitude)?;
        let lat_idx = find(&columns.latitude)?;
        let cat_idx = columns.category.as_deref().map(find).transpose()?;
        let weight_idx = columns.weight.as_deref().map(find).transpose()?;

        let mut points = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record.with_context(|| format!("read csv row {}", row + 1))?;
            let field = |idx: usize| record.get(idx).unwrap_or("").trim();
            let bad = |what: &str, value: &str| {
                MotionError::config(format!("csv row {}: invalid {what} '{value}'", row + 1))
            };

            let timestamp =
                parse_timestamp(field(ts_idx)).ok_or_else(|| bad("timestamp", field(ts_idx)))?;
            let lon: f64 = field(lon_idx)
                .parse()
                .map_err(|_| bad("longitude", field(lon_idx)))?;
            let lat: f64 = field(lat_idx)
                .parse()
                .map_err(|_| bad("latitude", field(lat_idx)))?;

            let mut point = Point::new(timestamp, lon, lat);
            if let Some(idx) = cat_idx
                && !field(idx).is_empty()
            {
                point.category = Some(Arc::from(field(idx)));
            }
            if let Some(idx) = weight_idx
                && !field(idx).is_empty()
            {
                point.weight = Some(field(idx).parse().map_err(|_| bad("weight", field(idx)))?);
            }
            points.push(point);
        }

        tracing::debug!(points = points.len(), partitions, "loaded points from csv");
        Self::partitioned(points, partitions)
    }
}

/// Parse RFC 3339, common naive date-time layouts (read as UTC), plain dates, or Unix seconds.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    for layout in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(t.and_utc());
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|t| t.and_utc());
    }
    s.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

#[cfg(test)]
#[path = "../../tests/unit/data/csv.rs"]
mod tests;
