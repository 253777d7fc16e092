use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use snafu::ResultExt;
use tracing::debug;

use crate::{
    models::{bar::BarSeries, request_params::BarsRequestParams},
    providers::{
        ApiSnafu, ClientBuildSnafu, DataProvider, InvalidHeaderSnafu, InvalidTickerSnafu,
        MalformedSnafu, NetworkSnafu, NoDataSnafu, ProviderError, ProviderInitError,
        yahoo_chart::{
            params::{YahooChartConfig, construct_params},
            response::{ChartResponse, into_bar_series},
        },
    },
};

/// Longest slice of an error body kept in an [`ProviderError::Api`] message.
const ERROR_BODY_LIMIT: usize = 200;

pub struct YahooChartProvider {
    client: Client,
    config: YahooChartConfig,
}

impl YahooChartProvider {
    /// Creates a new provider with the given connection settings.
    pub fn new(config: YahooChartConfig) -> Result<Self, ProviderInitError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_str(&config.user_agent).context(InvalidHeaderSnafu)?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self { client, config })
    }

    /// Creates a provider from defaults plus `YAHOO_CHART_*` environment overrides.
    pub fn from_env() -> Result<Self, ProviderInitError> {
        Self::new(YahooChartConfig::default().with_env_overrides()?)
    }

    pub fn config(&self) -> &YahooChartConfig {
        &self.config
    }

    fn url_for(&self, symbol: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), symbol)
    }
}

#[async_trait]
impl DataProvider for YahooChartProvider {
    async fn fetch_bars(&self, params: &BarsRequestParams) -> Result<BarSeries, ProviderError> {
        let symbol = params.symbol.as_str();
        let url = self.url_for(symbol);
        let query = construct_params(&params.range);
        debug!(%url, ?query, "requesting daily history");

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .context(NetworkSnafu { symbol })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return InvalidTickerSnafu { symbol }.fail();
        }

        let body = response.text().await.context(NetworkSnafu { symbol })?;
        if !status.is_success() {
            let excerpt: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return ApiSnafu {
                symbol,
                message: format!("HTTP {status}: {excerpt}"),
            }
            .fail();
        }

        let decoded: ChartResponse = serde_json::from_str(&body).map_err(|e| {
            MalformedSnafu {
                symbol,
                message: e.to_string(),
            }
            .build()
        })?;

        let series = into_bar_series(symbol, decoded)?.restrict_to(&params.range);
        if series.is_empty() {
            return NoDataSnafu { symbol }.fail();
        }
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_and_symbol() {
        let provider = YahooChartProvider::new(YahooChartConfig {
            base_url: "http://localhost:9/chart/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(provider.url_for("BTC-USD"), "http://localhost:9/chart/BTC-USD");
    }

    #[test]
    fn invalid_user_agent_is_rejected() {
        let result = YahooChartProvider::new(YahooChartConfig {
            user_agent: "bad\nagent".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(ProviderInitError::InvalidHeader { .. })));
    }
}
