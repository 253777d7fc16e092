use chrono::DateTime;
use serde::Deserialize;

use crate::models::bar::{Bar, BarSeries};
use crate::providers::{ApiSnafu, InvalidTickerSnafu, MalformedSnafu, NoDataSnafu, ProviderError};

#[derive(Deserialize, Debug)]
pub struct ChartResponse {
    pub chart: ChartEnvelope,
}

#[derive(Deserialize, Debug)]
pub struct ChartEnvelope {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ChartResult {
    #[serde(default)]
    pub meta: ChartMeta,
    /// Absent when the range holds no trading days.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Deserialize, Debug, Default)]
pub struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    pub gmtoffset: i64,
}

#[derive(Deserialize, Debug)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteBlock>,
    #[serde(default)]
    pub adjclose: Vec<AdjCloseBlock>,
}

#[derive(Deserialize, Debug, Default)]
pub struct QuoteBlock {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct AdjCloseBlock {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

/// Converts a decoded chart payload into the canonical series.
///
/// Rows with a null close use the adjusted close instead; rows with neither
/// are dropped. Timestamps are shifted into the exchange's day before the
/// date is taken.
pub fn into_bar_series(symbol: &str, response: ChartResponse) -> Result<BarSeries, ProviderError> {
    if let Some(err) = response.chart.error {
        return chart_error(symbol, err);
    }
    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return NoDataSnafu { symbol }.fail();
    };

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let adjclose = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .unwrap_or_default()
        .adjclose;
    let offset = result.meta.gmtoffset;

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().copied().enumerate() {
        let Some(close) = value_at(&quote.close, i).or_else(|| value_at(&adjclose, i)) else {
            continue;
        };
        let Some(stamp) = ts
            .checked_add(offset)
            .and_then(|local| DateTime::from_timestamp(local, 0))
        else {
            return MalformedSnafu {
                symbol,
                message: format!("timestamp {ts} out of range"),
            }
            .fail();
        };
        bars.push(Bar {
            date: stamp.date_naive(),
            open: value_at(&quote.open, i).unwrap_or(close),
            high: value_at(&quote.high, i).unwrap_or(close),
            low: value_at(&quote.low, i).unwrap_or(close),
            close,
            volume: value_at(&quote.volume, i).unwrap_or(0.0),
        });
    }

    if bars.is_empty() {
        return NoDataSnafu { symbol }.fail();
    }
    Ok(BarSeries::from_unordered(symbol, bars))
}

fn chart_error(symbol: &str, err: ChartError) -> Result<BarSeries, ProviderError> {
    if err.code.eq_ignore_ascii_case("Not Found") {
        return InvalidTickerSnafu { symbol }.fail();
    }
    ApiSnafu {
        symbol,
        message: format!(
            "{}: {}",
            err.code,
            err.description.unwrap_or_else(|| "no description".to_string())
        ),
    }
    .fail()
}

fn value_at(column: &[Option<f64>], i: usize) -> Option<f64> {
    column.get(i).copied().flatten().filter(|v| v.is_finite())
}
