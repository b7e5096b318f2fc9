//! # Build Order Planner Tools
//!
//! Command-line tools for working with build orders:
//! - Build order files (RON)
//! - Simulation transcripts and JSON reports
//! - Catalog validators

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod build_order;
pub mod error;
pub mod report;
pub mod validate;
