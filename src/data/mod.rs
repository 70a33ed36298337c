/// CSV loading for point datasets.
pub mod csv;
/// Time-indexed point collections and the windowed subset contract.
pub mod dataset;
/// Point records.
pub mod point;
