use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use market_data_ingestor::{
    models::{
        bar::{Bar, BarSeries},
        request_params::BarsRequestParams,
    },
    providers::{
        ApiSnafu, DataProvider, InvalidTickerSnafu, ProviderError,
        yahoo_chart::YahooChartProvider,
    },
};
use volatility_analyzer::{
    config::{AnalysisConfig, SourceConfig},
    errors::PipelineError,
    pipeline::{BatchRequest, run_batch},
};

/// Serves fixed close series and counts calls.
#[derive(Default)]
struct FakeProvider {
    closes: HashMap<String, Vec<f64>>,
    broken: Vec<String>,
    calls: AtomicUsize,
}

impl FakeProvider {
    fn with(mut self, symbol: &str, closes: &[f64]) -> Self {
        self.closes.insert(symbol.to_string(), closes.to_vec());
        self
    }

    fn broken(mut self, symbol: &str) -> Self {
        self.broken.push(symbol.to_string());
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataProvider for FakeProvider {
    async fn fetch_bars(&self, params: &BarsRequestParams) -> Result<BarSeries, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken.contains(&params.symbol) {
            return ApiSnafu {
                symbol: params.symbol.clone(),
                message: "upstream exploded",
            }
            .fail();
        }
        let Some(closes) = self.closes.get(&params.symbol) else {
            return InvalidTickerSnafu {
                symbol: params.symbol.clone(),
            }
            .fail();
        };
        let start = params.range.start();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, c)| Bar::from_close(start + Days::new(i as u64), *c))
            .collect();
        Ok(BarSeries::from_unordered(&params.symbol, bars))
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn request(tickers: &[&str], start: NaiveDate, end: NaiveDate) -> BatchRequest {
    BatchRequest {
        tickers: tickers.iter().map(|t| t.to_string()).collect(),
        start,
        end,
    }
}

#[tokio::test]
async fn invalid_ticker_does_not_affect_the_valid_one() {
    for order in [["A", "B"], ["B", "A"]] {
        let provider = FakeProvider::default().with("A", &[100.0, 110.0, 121.0]);
        let report = run_batch(
            &provider,
            &request(&order, day(1), day(31)),
            &AnalysisConfig::default(),
        )
        .await;

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.success_count(), 1);
        let tickers: Vec<&str> = report.outcomes.iter().map(|o| o.ticker.as_str()).collect();
        assert_eq!(tickers, order);

        let (ticker, ok) = report.succeeded().next().unwrap();
        assert_eq!(ticker, "A");
        assert!((ok.summary.total_return.unwrap() - 0.21).abs() < 1e-9);
        assert_eq!(ok.augmented.len(), 3);

        let (ticker, err) = report.failed().next().unwrap();
        assert_eq!(ticker, "B");
        assert!(matches!(err, PipelineError::InvalidTicker { ticker } if ticker == "B"));
    }
}

#[tokio::test]
async fn equal_dates_fail_every_ticker_without_fetching() {
    let provider = FakeProvider::default().with("A", &[1.0, 2.0]);
    let report = run_batch(
        &provider,
        &request(&["A", "B", "C"], day(5), day(5)),
        &AnalysisConfig::default(),
    )
    .await;

    assert_eq!(provider.calls(), 0);
    assert_eq!(report.failure_count(), 3);
    assert!(
        report
            .failed()
            .all(|(_, e)| matches!(e, PipelineError::InvalidDateRange(_)))
    );
}

#[tokio::test]
async fn inverted_range_is_rejected_too() {
    let provider = FakeProvider::default();
    let report = run_batch(
        &provider,
        &request(&["A"], day(10), day(2)),
        &AnalysisConfig::default(),
    )
    .await;
    assert_eq!(provider.calls(), 0);
    assert_eq!(report.outcomes[0].result.as_ref().unwrap_err().kind(), "InvalidDateRange");
}

#[tokio::test]
async fn empty_and_failing_sources_are_classified() {
    let provider = FakeProvider::default()
        .with("EMPTY", &[])
        .with("GOOD", &[10.0, 11.0])
        .broken("DOWN");
    let report = run_batch(
        &provider,
        &request(&["EMPTY", "DOWN", "GOOD"], day(1), day(20)),
        &AnalysisConfig::default(),
    )
    .await;

    assert_eq!(provider.calls(), 3);
    let kinds: Vec<&str> = report
        .outcomes
        .iter()
        .map(|o| o.result.as_ref().map_or_else(|e| e.kind(), |_| "ok"))
        .collect();
    assert_eq!(kinds, ["InsufficientData", "DataSourceError", "ok"]);
}

#[tokio::test]
async fn each_ticker_is_analyzed_independently() {
    let long: Vec<f64> = (0..80).map(|i| 50.0 + (i as f64 * 0.3).cos()).collect();
    let provider = FakeProvider::default()
        .with("LONG", &long)
        .with("SHORT", &[5.0, 5.5, 6.0]);

    let both = run_batch(
        &provider,
        &request(&["LONG", "SHORT"], day(1), day(31)),
        &AnalysisConfig::default(),
    )
    .await;
    let alone = run_batch(
        &provider,
        &request(&["SHORT"], day(1), day(31)),
        &AnalysisConfig::default(),
    )
    .await;

    let short_in_batch = both.succeeded().find(|(t, _)| *t == "SHORT").unwrap().1;
    let short_alone = alone.succeeded().next().unwrap().1;
    assert_eq!(short_in_batch.augmented, short_alone.augmented);
    assert_eq!(short_in_batch.summary, short_alone.summary);

    let long_rows = both.succeeded().next().unwrap().1.augmented.rows();
    assert!(long_rows[50].vol_long.is_some());
    assert!(short_in_batch.augmented.rows().iter().all(|r| r.ma_short.is_none()));
}

#[tokio::test]
async fn unreachable_source_is_a_network_error() {
    // Nothing listens on the discard port locally.
    let source = SourceConfig {
        base_url: Some("http://127.0.0.1:9/v8/finance/chart".into()),
        timeout_secs: Some(2),
        ..Default::default()
    };
    let provider = YahooChartProvider::new(source.yahoo_config()).unwrap();
    let report = run_batch(
        &provider,
        &request(&["AAPL"], day(1), day(20)),
        &AnalysisConfig::default(),
    )
    .await;

    let (ticker, err) = report.failed().next().unwrap();
    assert_eq!(ticker, "AAPL");
    assert_eq!(err.kind(), "NetworkError");
    assert!(matches!(err, PipelineError::Network { .. }));
}

#[tokio::test]
async fn benchmark_is_fetched_once_and_yields_beta() {
    let path = [100.0, 102.0, 101.0, 104.0, 103.5];
    let provider = FakeProvider::default()
        .with("SPY", &path)
        .with("A", &path)
        .with("B", &[10.0, 10.1, 10.3, 10.2, 10.4]);
    let mut config = AnalysisConfig::default();
    config.risk.benchmark = Some("SPY".into());

    let report = run_batch(&provider, &request(&["A", "B"], day(1), day(20)), &config).await;

    assert_eq!(provider.calls(), 3);
    let betas: Vec<Option<f64>> = report.succeeded().map(|(_, r)| r.risk.beta).collect();
    assert!((betas[0].unwrap() - 1.0).abs() < 1e-9);
    assert!(betas[1].is_some());
}

#[tokio::test]
async fn missing_benchmark_only_drops_beta() {
    let provider = FakeProvider::default().with("A", &[1.0, 1.1, 1.05]);
    let mut config = AnalysisConfig::default();
    config.risk.benchmark = Some("NOPE".into());

    let report = run_batch(&provider, &request(&["A"], day(1), day(20)), &config).await;

    assert_eq!(report.success_count(), 1);
    assert_eq!(report.succeeded().next().unwrap().1.risk.beta, None);
}
