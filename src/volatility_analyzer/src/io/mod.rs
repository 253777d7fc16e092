//! Output side of the pipeline: CSV persistence and chart rendering.

pub mod charts;
pub mod sink;
