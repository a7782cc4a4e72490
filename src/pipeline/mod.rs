//! Pipeline module - loading, cleaning, weighting, raking and statistics

pub mod cleaning;
pub mod columns;
pub mod error;
pub mod loader;
pub mod missing;
pub mod raking;
pub mod stats;
pub mod tables;
pub mod targets;
pub mod weights;

pub use cleaning::*;
pub use columns::{category_values, column_names, numeric_values};
pub use error::*;
pub use loader::*;
pub use missing::*;
pub use raking::*;
pub use stats::*;
pub use tables::*;
pub use targets::*;
pub use weights::*;
