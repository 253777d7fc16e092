//! Daily history from the Yahoo Finance chart endpoint.

pub mod params;
pub mod provider;
pub mod response;

pub use params::YahooChartConfig;
pub use provider::YahooChartProvider;
