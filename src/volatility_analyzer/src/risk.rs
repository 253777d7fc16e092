//! Risk ratios on daily log returns.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use market_data_ingestor::models::bar::BarSeries;
use serde::{Deserialize, Serialize};

use crate::indicators::{AugmentedSeries, IndicatorConfig};
use crate::stats::{self, StdDevKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskConfig {
    /// Annual risk-free rate used by the Sharpe ratio.
    pub risk_free_rate: f64,
    /// Tail probability for historical value-at-risk (0.05 = 95% VaR).
    pub var_level: f64,
    /// Ticker to measure beta against, fetched once per batch.
    pub benchmark: Option<String>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.01,
            var_level: 0.05,
            benchmark: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskMetrics {
    pub sharpe_ratio: f64,
    /// Positive number: the loss not exceeded with probability `1 - var_level`.
    pub value_at_risk: f64,
    /// `None` without a benchmark or without enough overlapping days.
    pub beta: Option<f64>,
}

/// Benchmark log returns keyed by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkReturns {
    pub symbol: String,
    returns: BTreeMap<NaiveDate, f64>,
}

impl BenchmarkReturns {
    pub fn from_series(series: &BarSeries) -> Self {
        Self {
            symbol: series.symbol.clone(),
            returns: dated_log_returns(series.dates(), &series.closes()),
        }
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    /// Pairs `(asset, benchmark)` for the dates both sides have.
    fn align(&self, asset: &BTreeMap<NaiveDate, f64>) -> (Vec<f64>, Vec<f64>) {
        asset
            .iter()
            .filter_map(|(date, a)| self.returns.get(date).map(|b| (*a, *b)))
            .unzip()
    }
}

fn dated_log_returns(dates: Vec<NaiveDate>, closes: &[f64]) -> BTreeMap<NaiveDate, f64> {
    dates
        .into_iter()
        .zip(compute_log_returns(closes))
        .filter_map(|(date, r)| r.map(|r| (date, r)))
        .collect()
}

/// `ln(close[i] / close[i-1])`, undefined across non-positive prices.
pub fn compute_log_returns(closes: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return out;
    }
    out.push(None);
    out.extend(closes.windows(2).map(|pair| {
        let (prev, cur) = (pair[0], pair[1]);
        let valid = |p: f64| p.is_finite() && p > 0.0;
        (valid(prev) && valid(cur)).then(|| (cur / prev).ln())
    }));
    out
}

/// Annualized Sharpe ratio; 0 when there is no spread to divide by.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, indicators: &IndicatorConfig) -> f64 {
    let (Some(mean), Some(sd)) = (
        stats::mean(returns),
        stats::std_dev(returns, indicators.std_dev),
    ) else {
        return 0.0;
    };
    let annual_vol = sd * indicators.annualization_factor();
    if annual_vol == 0.0 {
        return 0.0;
    }
    (mean * indicators.trading_days - risk_free_rate) / annual_vol
}

/// Historical value-at-risk: the negated `level` quantile of returns.
pub fn historical_var(returns: &[f64], level: f64) -> f64 {
    stats::quantile(returns, level).map_or(0.0, |q| -q)
}

/// Covariance with the benchmark over the benchmark's variance.
///
/// Both slices must be aligned day by day. `None` when the benchmark does
/// not move or there are too few pairs.
pub fn beta(asset: &[f64], benchmark: &[f64], kind: StdDevKind) -> Option<f64> {
    let variance = stats::covariance(benchmark, benchmark, kind)?;
    if variance == 0.0 {
        return None;
    }
    Some(stats::covariance(asset, benchmark, kind)? / variance)
}

pub fn risk_metrics(
    series: &AugmentedSeries,
    indicators: &IndicatorConfig,
    risk: &RiskConfig,
    benchmark: Option<&BenchmarkReturns>,
) -> RiskMetrics {
    let dates = series.rows().iter().map(|r| r.bar.date).collect();
    let dated = dated_log_returns(dates, &series.closes());
    let log_returns: Vec<f64> = dated.values().copied().collect();

    RiskMetrics {
        sharpe_ratio: sharpe_ratio(&log_returns, risk.risk_free_rate, indicators),
        value_at_risk: historical_var(&log_returns, risk.var_level),
        beta: benchmark.and_then(|bench| {
            let (asset, bench) = bench.align(&dated);
            beta(&asset, &bench, indicators.std_dev)
        }),
    }
}
