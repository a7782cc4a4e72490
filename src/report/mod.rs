//! Report module - raking summaries, JSON export and charts

pub mod charts;
pub mod raking_export;
pub mod summary;

pub use charts::*;
pub use raking_export::*;
pub use summary::*;
