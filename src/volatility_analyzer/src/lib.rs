pub mod cli;
pub mod config;
pub mod console;
pub mod errors;
pub mod indicators;
pub mod io;
pub mod pipeline;
pub mod risk;
pub mod stats;
pub mod summary;
pub mod validation;
