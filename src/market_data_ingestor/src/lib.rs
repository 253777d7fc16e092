//! Daily market data ingestion: the canonical bar model and the providers
//! that fill it.

pub mod models;
pub mod providers;
