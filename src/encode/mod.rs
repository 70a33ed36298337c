//! Frame sinks.
//!
//! Sinks consume composited frames in window order and are used by `MotionVideo::render`.

/// `ffmpeg`-based MP4 sink.
pub mod ffmpeg;
/// Looping GIF sink.
pub mod gif;
/// Frame sink trait and built-in sinks.
pub mod sink;
