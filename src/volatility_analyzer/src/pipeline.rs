//! Sequential batch runner.
//!
//! Each ticker is fetched, validated and analyzed on its own; a failure is
//! recorded in that ticker's [`TickerOutcome`] and the batch moves on.

use chrono::NaiveDate;
use market_data_ingestor::{
    models::request_params::{BarsRequestParams, DateRange},
    providers::DataProvider,
};
use tracing::{info, warn};

use crate::{
    config::AnalysisConfig,
    errors::PipelineError,
    indicators::{AugmentedSeries, augment},
    risk::{BenchmarkReturns, RiskMetrics, risk_metrics},
    summary::{SummaryRecord, summarize},
    validation::{ensure_rows, validate_range},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub tickers: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Everything computed for one successful ticker.
#[derive(Debug, Clone)]
pub struct TickerReport {
    pub augmented: AugmentedSeries,
    pub summary: SummaryRecord,
    pub risk: RiskMetrics,
}

#[derive(Debug)]
pub struct TickerOutcome {
    pub ticker: String,
    pub result: Result<TickerReport, PipelineError>,
}

/// One outcome per requested ticker, in request order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<TickerOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &TickerReport)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|r| (o.ticker.as_str(), r)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &PipelineError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.ticker.as_str(), e)))
    }

    pub fn success_count(&self) -> usize {
        self.succeeded().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }
}

/// Runs the whole batch, never short-circuiting on a single ticker.
///
/// The range is checked before each fetch, so an invalid one fails every
/// ticker without touching the provider. A configured benchmark is fetched
/// once, up front.
pub async fn run_batch(
    provider: &dyn DataProvider,
    request: &BatchRequest,
    config: &AnalysisConfig,
) -> BatchReport {
    let benchmark = match (&config.risk.benchmark, validate_range(request.start, request.end)) {
        (Some(symbol), Ok(range)) => fetch_benchmark(provider, symbol, range).await,
        _ => None,
    };

    let mut outcomes = Vec::with_capacity(request.tickers.len());
    for ticker in &request.tickers {
        let result = match validate_range(request.start, request.end) {
            Ok(range) => {
                analyze_ticker(provider, ticker, range, config, benchmark.as_ref()).await
            }
            Err(err) => Err(err),
        };
        match &result {
            Ok(report) => info!(
                ticker = %ticker,
                rows = report.augmented.len(),
                "analysis complete"
            ),
            Err(err) => warn!(ticker = %ticker, kind = err.kind(), "ticker failed: {err}"),
        }
        outcomes.push(TickerOutcome {
            ticker: ticker.clone(),
            result,
        });
    }
    BatchReport { outcomes }
}

/// Benchmark returns for beta; a failed fetch only costs the beta column.
async fn fetch_benchmark(
    provider: &dyn DataProvider,
    symbol: &str,
    range: DateRange,
) -> Option<BenchmarkReturns> {
    let params = BarsRequestParams::new(symbol, range);
    match provider.fetch_bars(&params).await {
        Ok(series) => {
            let returns = BenchmarkReturns::from_series(&series);
            if returns.is_empty() {
                warn!(benchmark = symbol, "benchmark has no returns, beta skipped");
                return None;
            }
            info!(benchmark = symbol, returns = returns.len(), "fetched benchmark");
            Some(returns)
        }
        Err(err) => {
            warn!(benchmark = symbol, "benchmark fetch failed, beta skipped: {err}");
            None
        }
    }
}

/// Fetch, validate and analyze a single ticker.
pub async fn analyze_ticker(
    provider: &dyn DataProvider,
    ticker: &str,
    range: DateRange,
    config: &AnalysisConfig,
    benchmark: Option<&BenchmarkReturns>,
) -> Result<TickerReport, PipelineError> {
    let params = BarsRequestParams::new(ticker, range);
    let series = provider
        .fetch_bars(&params)
        .await
        .map_err(|err| PipelineError::from_provider(ticker, err))?;
    ensure_rows(&series)?;
    info!(ticker, rows = series.len(), "fetched history");

    let augmented = augment(&series, &config.indicators)?;
    let summary = summarize(&augmented, &config.indicators)?;
    let risk = risk_metrics(&augmented, &config.indicators, &config.risk, benchmark);
    Ok(TickerReport {
        augmented,
        summary,
        risk,
    })
}
