//! svykit: Survey Data Toolkit
//!
//! A library for cleaning survey records, raking sample weights to known
//! population margins, and computing weighted statistics and tables.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
