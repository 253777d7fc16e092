//! Derived columns over a daily close series.
//!
//! Every function here is pure and length-preserving: the output has one
//! entry per input row and `None` marks an undefined value (a window that is
//! not yet full, or a return across an invalid price).

use market_data_ingestor::models::bar::{Bar, BarSeries};
use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;
use crate::stats::{self, StdDevKind};

pub const SHORT_WINDOW: usize = 20;
pub const LONG_WINDOW: usize = 50;
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Window sizes and volatility conventions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub short_window: usize,
    pub long_window: usize,
    /// Annualization uses `sqrt(trading_days)`.
    pub trading_days: f64,
    pub std_dev: StdDevKind,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            short_window: SHORT_WINDOW,
            long_window: LONG_WINDOW,
            trading_days: TRADING_DAYS_PER_YEAR,
            std_dev: StdDevKind::Sample,
        }
    }
}

impl IndicatorConfig {
    pub fn annualization_factor(&self) -> f64 {
        self.trading_days.sqrt()
    }
}

/// One raw bar plus its derived columns.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedRow {
    pub bar: Bar,
    pub daily_return: Option<f64>,
    pub ma_short: Option<f64>,
    pub ma_long: Option<f64>,
    pub vol_short: Option<f64>,
    pub vol_long: Option<f64>,
}

/// The raw series extended with indicator columns, row for row.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedSeries {
    pub symbol: String,
    pub short_window: usize,
    pub long_window: usize,
    rows: Vec<AugmentedRow>,
}

impl AugmentedSeries {
    pub fn rows(&self) -> &[AugmentedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.bar.close).collect()
    }

    pub fn daily_returns(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.daily_return).collect()
    }

    /// Defined daily returns only, in date order.
    pub fn defined_returns(&self) -> Vec<f64> {
        self.rows.iter().filter_map(|r| r.daily_return).collect()
    }
}

/// A price that can sit in the denominator of a return.
fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Simple returns `close[i] / close[i-1] - 1`.
///
/// The first entry is undefined, as is any return that touches a zero,
/// negative or non-finite price.
pub fn compute_returns(closes: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return out;
    }
    out.push(None);
    out.extend(closes.windows(2).map(|pair| {
        let (prev, cur) = (pair[0], pair[1]);
        (is_valid_price(prev) && is_valid_price(cur)).then(|| cur / prev - 1.0)
    }));
    out
}

/// Trailing arithmetic mean over `window` rows including the current one.
pub fn compute_moving_average(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; closes.len()];
    }
    let mut out = vec![None; closes.len().min(window - 1)];
    out.extend(closes.windows(window).map(stats::mean));
    out
}

/// Trailing standard deviation of returns, scaled by `annualization_factor`.
///
/// A window is defined only when every return inside it is defined, so on a
/// clean series the first value lands at index `window`.
pub fn compute_rolling_volatility(
    returns: &[Option<f64>],
    window: usize,
    annualization_factor: f64,
    kind: StdDevKind,
) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; returns.len()];
    }
    let mut out = vec![None; returns.len().min(window - 1)];
    out.extend(returns.windows(window).map(|w| {
        let values: Option<Vec<f64>> = w.iter().copied().collect();
        values
            .and_then(|v| stats::std_dev(&v, kind))
            .map(|sd| sd * annualization_factor)
    }));
    out
}

/// Builds the augmented series for one instrument.
///
/// Fails only on an empty series. A series shorter than the windows is
/// returned as-is with the affected columns undefined.
pub fn augment(
    series: &BarSeries,
    config: &IndicatorConfig,
) -> Result<AugmentedSeries, PipelineError> {
    if series.is_empty() {
        return Err(PipelineError::InsufficientData {
            ticker: series.symbol.clone(),
        });
    }

    let closes = series.closes();
    let factor = config.annualization_factor();
    let returns = compute_returns(&closes);
    let ma_short = compute_moving_average(&closes, config.short_window);
    let ma_long = compute_moving_average(&closes, config.long_window);
    let vol_short =
        compute_rolling_volatility(&returns, config.short_window, factor, config.std_dev);
    let vol_long = compute_rolling_volatility(&returns, config.long_window, factor, config.std_dev);

    let rows = series
        .bars()
        .iter()
        .enumerate()
        .map(|(i, bar)| AugmentedRow {
            bar: bar.clone(),
            daily_return: returns[i],
            ma_short: ma_short[i],
            ma_long: ma_long[i],
            vol_short: vol_short[i],
            vol_long: vol_long[i],
        })
        .collect();

    Ok(AugmentedSeries {
        symbol: series.symbol.clone(),
        short_window: config.short_window,
        long_window: config.long_window,
        rows,
    })
}
