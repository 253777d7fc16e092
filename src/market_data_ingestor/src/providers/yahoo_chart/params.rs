use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use shared_utils::env::{get_env_override, get_env_parsed};
use snafu::ResultExt;

use crate::models::request_params::DateRange;
use crate::providers::{EnvSnafu, ProviderInitError};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// The endpoint rejects requests without a browser-like agent.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

pub const BASE_URL_ENV: &str = "YAHOO_CHART_BASE_URL";
pub const TIMEOUT_ENV: &str = "YAHOO_CHART_TIMEOUT_SECS";

/// Connection settings for [`YahooChartProvider`](super::YahooChartProvider).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct YahooChartConfig {
    pub base_url: String,
    #[serde(with = "secs")]
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for YahooChartConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl YahooChartConfig {
    /// Applies `YAHOO_CHART_BASE_URL` and `YAHOO_CHART_TIMEOUT_SECS` when set.
    pub fn with_env_overrides(mut self) -> Result<Self, ProviderInitError> {
        if let Some(url) = get_env_override(BASE_URL_ENV) {
            self.base_url = url;
        }
        if let Some(secs) = get_env_parsed::<u64>(TIMEOUT_ENV).context(EnvSnafu)? {
            self.timeout = Duration::from_secs(secs);
        }
        Ok(self)
    }
}

/// Builds the query string for one daily-history request.
///
/// `period2` is the exclusive end of the window, which matches
/// [`DateRange`] semantics directly.
pub fn construct_params(range: &DateRange) -> Vec<(String, String)> {
    let epoch = |d: chrono::NaiveDate| d.and_time(NaiveTime::MIN).and_utc().timestamp();
    vec![
        ("period1".to_string(), epoch(range.start()).to_string()),
        ("period2".to_string(), epoch(range.end()).to_string()),
        ("interval".to_string(), "1d".to_string()),
        ("events".to_string(), "history".to_string()),
        ("includeAdjustedClose".to_string(), "true".to_string()),
    ]
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
