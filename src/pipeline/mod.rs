/// `MotionVideo` and its render options.
pub mod motion;
