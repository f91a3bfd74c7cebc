//! The scan data model: what gets scanned, and what a scan produces.

pub mod outcome;
pub mod plan;
pub mod ports;
pub mod target;
