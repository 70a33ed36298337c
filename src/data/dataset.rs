use rayon::prelude::*;

use crate::data::point::Point;
use crate::foundation::error::{MotionError, MotionResult};
use crate::scene::playback::TimeWindow;

/// Source of time-bounded point subsets.
///
/// Implementations must be side-effect-free and repeatable: the same window always yields the
/// same points in the same order. Frames for different windows may be computed concurrently,
/// hence `Sync`.
pub trait WindowedDataSource: Send + Sync {
    /// Return every point with `window.start <= timestamp < window.end`, in dataset order.
    fn subset(&self, window: &TimeWindow) -> MotionResult<Vec<Point>>;

    /// Total number of points, when known.
    fn len_hint(&self) -> Option<usize> {
        None
    }
}

/// In-memory, time-sorted point collection split into contiguous partitions.
///
/// Partitions are scanned in parallel by [`WindowedDataSource::subset`] and concatenated in
/// partition order, so the result does not depend on scheduling.
#[derive(Clone, Debug, Default)]
pub struct PointDataset {
    partitions: Vec<Vec<Point>>,
    len: usize,
}

impl PointDataset {
    /// Build a single-partition dataset. Points are stable-sorted by timestamp.
    pub fn new(mut points: Vec<Point>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self {
            len: points.len(),
            partitions: vec![points],
        }
    }

    /// Build a dataset split into `n` contiguous, roughly equal partitions.
    pub fn partitioned(mut points: Vec<Point>, n: usize) -> MotionResult<Self> {
        if n == 0 {
            return Err(MotionError::validation(
                "dataset partition count must be >= 1",
            ));
        }
        points.sort_by_key(|p| p.timestamp);
        let len = points.len();

        let per = len.div_ceil(n).max(1);
        let mut partitions = Vec::with_capacity(n);
        let mut rest = points;
        while rest.len() > per {
            let tail = rest.split_off(per);
            partitions.push(rest);
            rest = tail;
        }
        partitions.push(rest);

        Ok(Self { partitions, len })
    }

    /// Total number of points.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Return `true` when the dataset holds no points.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of partitions.
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Iterate all points in timestamp order.
    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.partitions.iter().flatten()
    }
}

fn window_slice<'a>(partition: &'a [Point], window: &TimeWindow) -> &'a [Point] {
    let lo = partition.partition_point(|p| p.timestamp < window.start);
    let hi = partition.partition_point(|p| p.timestamp < window.end);
    &partition[lo..hi.max(lo)]
}

impl WindowedDataSource for PointDataset {
    fn subset(&self, window: &TimeWindow) -> MotionResult<Vec<Point>> {
        if window.start > window.end {
            return Err(MotionError::data_source(
                *window,
                "window start is after window end",
            ));
        }

        let parts: Vec<&[Point]> = if self.partitions.len() == 1 {
            vec![window_slice(&self.partitions[0], window)]
        } else {
            self.partitions
                .par_iter()
                .map(|p| window_slice(p, window))
                .collect()
        };

        let total = parts.iter().map(|p| p.len()).sum();
        let mut out = Vec::with_capacity(total);
        for part in parts {
            out.extend_from_slice(part);
        }
        Ok(out)
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.len)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/data/dataset.rs"]
mod tests;
