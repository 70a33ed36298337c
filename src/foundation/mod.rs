/// Straight RGBA colors.
pub mod color;
/// Error taxonomy.
pub mod error;
/// Fixed-point channel math.
pub mod math;
