/// Temporal playback parameters and window enumeration.
pub mod playback;
/// Geographic extent and output resolution.
pub mod viewport;
