//! Provider abstraction for daily market data sources.
//!
//! This module defines the [`DataProvider`] trait, which serves as a unified interface
//! for fetching daily bar history from any source (the Yahoo chart API, a directory
//! of CSV exports, an in-memory fixture in tests).
//!
//! The trait is designed for async usage and supports dynamic dispatch (`dyn DataProvider`)
//! for runtime selection of providers.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use market_data_ingestor::models::{
//!     bar::BarSeries,
//!     request_params::BarsRequestParams,
//! };
//! use market_data_ingestor::providers::{DataProvider, ProviderError};
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl DataProvider for MyProvider {
//!     async fn fetch_bars(
//!         &self,
//!         params: &BarsRequestParams,
//!     ) -> Result<BarSeries, ProviderError> {
//!         Ok(BarSeries::empty(params.symbol.clone()))
//!     }
//! }
//! ```
//!

pub mod csv_dir;
pub mod yahoo_chart;

use std::path::PathBuf;

use async_trait::async_trait;
use shared_utils::env::InvalidEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::{bar::BarSeries, request_params::BarsRequestParams};

/// Trait for fetching daily bar history from a market data source.
///
/// Implementations return the whole requested window for one symbol, already
/// restricted to the requested range.
#[async_trait]
pub trait DataProvider {
    /// Fetches daily bars for the given request parameters.
    ///
    /// # Arguments
    ///
    /// * `params` - The symbol and date range to fetch.
    ///
    /// # Returns
    ///
    /// * `Ok(BarSeries)` - The bars for the symbol, ascending by date.
    /// * `Err(ProviderError)` - If the symbol is unknown, nothing was returned, or
    ///   the source could not be reached.
    async fn fetch_bars(&self, params: &BarsRequestParams) -> Result<BarSeries, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// A header value contains invalid characters.
    #[snafu(display("Invalid header value: {source}"))]
    InvalidHeader {
        source: reqwest::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },

    /// An environment override is present but unusable.
    #[snafu(display("{source}"))]
    Env {
        source: InvalidEnvVarError,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `DataProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// The source has no record of the symbol.
    #[snafu(display("Unknown symbol '{symbol}'"))]
    InvalidTicker {
        symbol: String,
        backtrace: Backtrace,
    },

    /// The symbol exists but no rows fall inside the requested range.
    #[snafu(display("No data returned for '{symbol}'"))]
    NoData {
        symbol: String,
        backtrace: Backtrace,
    },

    /// The source could not be reached (connection failure, timeout).
    #[snafu(display("Request for '{symbol}' failed: {source}"))]
    Network {
        symbol: String,
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The source answered with an error status or error payload.
    #[snafu(display("API error for '{symbol}': {message}"))]
    Api {
        symbol: String,
        message: String,
        backtrace: Backtrace,
    },

    /// The payload could not be interpreted as daily bars.
    #[snafu(display("Malformed data for '{symbol}': {message}"))]
    Malformed {
        symbol: String,
        message: String,
        backtrace: Backtrace,
    },

    /// A local file could not be read.
    #[snafu(display("Failed to read {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },
}
