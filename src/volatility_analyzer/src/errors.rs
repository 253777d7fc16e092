use market_data_ingestor::{models::request_params::DateRangeError, providers::ProviderError};
use thiserror::Error;

/// Why one ticker of a batch produced no report.
///
/// Every variant is recoverable at the batch level: the runner records it and
/// moves on to the next ticker.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The data source has no record of the ticker.
    #[error("invalid ticker '{ticker}'")]
    InvalidTicker { ticker: String },

    /// Start is not strictly before end, or a date did not parse.
    #[error("invalid date range: {0}")]
    InvalidDateRange(#[from] DateRangeError),

    /// The source returned zero rows.
    #[error("insufficient data for '{ticker}': no rows returned")]
    InsufficientData { ticker: String },

    /// The source could not be reached.
    #[error("network error: {source}")]
    Network {
        ticker: String,
        #[source]
        source: ProviderError,
    },

    /// Any other data source failure (error payloads, unreadable files).
    #[error("data source error: {source}")]
    DataSource {
        ticker: String,
        #[source]
        source: ProviderError,
    },
}

impl PipelineError {
    /// Sorts a provider failure into the pipeline's error kinds.
    pub fn from_provider(ticker: &str, err: ProviderError) -> Self {
        let ticker = ticker.to_string();
        match err {
            ProviderError::InvalidTicker { .. } => Self::InvalidTicker { ticker },
            ProviderError::NoData { .. } => Self::InsufficientData { ticker },
            source @ ProviderError::Network { .. } => Self::Network { ticker, source },
            source => Self::DataSource { ticker, source },
        }
    }

    /// Short stable label for reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidTicker { .. } => "InvalidTicker",
            Self::InvalidDateRange(_) => "InvalidDateRange",
            Self::InsufficientData { .. } => "InsufficientData",
            Self::Network { .. } => "NetworkError",
            Self::DataSource { .. } => "DataSourceError",
        }
    }
}
