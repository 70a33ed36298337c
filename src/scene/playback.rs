use std::fmt;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

use crate::foundation::error::{MotionError, MotionResult};

/// Half-open temporal slice `[start, end)` rendered into one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    /// 0-based frame index of this window within its playback.
    pub index: u64,
    /// Inclusive window start.
    pub start: DateTime<Utc>,
    /// Exclusive window end.
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Return `true` when `t` is inside `[start, end)`.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} [{}, {})",
            self.index,
            self.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.end.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}

/// Temporal playback: bounds, per-frame duration, step between frame starts, and output rate.
///
/// `frame_length` may exceed `frame_step`, in which case consecutive windows overlap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackSpec {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    frame_length: TimeDelta,
    frame_step: TimeDelta,
    frame_rate: u32,
}

impl PlaybackSpec {
    /// Create a validated playback.
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        frame_length: TimeDelta,
        frame_step: TimeDelta,
        frame_rate: u32,
    ) -> MotionResult<Self> {
        if start >= end {
            return Err(MotionError::validation(format!(
                "playback start ({start}) must be before end ({end})"
            )));
        }
        if frame_length <= TimeDelta::zero() {
            return Err(MotionError::validation(
                "playback frame_length must be positive",
            ));
        }
        if frame_step <= TimeDelta::zero() {
            return Err(MotionError::validation(
                "playback frame_step must be positive",
            ));
        }
        if frame_rate == 0 {
            return Err(MotionError::validation(
                "playback frame_rate must be non-zero",
            ));
        }
        Ok(Self {
            start,
            end,
            frame_length,
            frame_step,
            frame_rate,
        })
    }

    /// Inclusive playback start.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive playback end.
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Duration of data covered by one frame.
    pub fn frame_length(&self) -> TimeDelta {
        self.frame_length
    }

    /// Distance between consecutive frame starts.
    pub fn frame_step(&self) -> TimeDelta {
        self.frame_step
    }

    /// Output frames per second.
    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    /// Display time of one output frame (`1 / frame_rate`).
    pub fn frame_delay(&self) -> std::time::Duration {
        std::time::Duration::from_nanos(1_000_000_000 / u64::from(self.frame_rate))
    }

    /// Number of windows: `ceil((end - start) / frame_step)`.
    pub fn frame_count(&self) -> u64 {
        let total = nanos(self.end - self.start);
        let step = nanos(self.frame_step);
        ((total + step - 1) / step) as u64
    }

    /// Iterate the render windows in temporal order.
    ///
    /// Window `i` starts at `start + i * frame_step`; its end is clamped to the playback end.
    pub fn windows(&self) -> Windows {
        Windows {
            playback: *self,
            cursor: Some(self.start),
            index: 0,
        }
    }
}

fn nanos(d: TimeDelta) -> i128 {
    i128::from(d.num_seconds()) * 1_000_000_000 + i128::from(d.subsec_nanos())
}

/// Iterator over a playback's [`TimeWindow`]s.
#[derive(Clone, Debug)]
pub struct Windows {
    playback: PlaybackSpec,
    cursor: Option<DateTime<Utc>>,
    index: u64,
}

impl Iterator for Windows {
    type Item = TimeWindow;

    fn next(&mut self) -> Option<Self::Item> {
        let t = self.cursor?;
        if t >= self.playback.end {
            self.cursor = None;
            return None;
        }

        let end = t
            .checked_add_signed(self.playback.frame_length)
            .map_or(self.playback.end, |e| e.min(self.playback.end));
        let window = TimeWindow {
            index: self.index,
            start: t,
            end,
        };

        self.cursor = t.checked_add_signed(self.playback.frame_step);
        self.index += 1;
        Some(window)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/playback.rs"]
mod tests;
