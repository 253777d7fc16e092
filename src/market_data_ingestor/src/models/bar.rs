//! Canonical in-memory representation of a daily OHLCV bar.
//!
//! This struct is used as the standard output for all [`DataProvider`](crate::providers::DataProvider)
//! implementations, regardless of asset class (equities, crypto pairs, etc.).

use chrono::NaiveDate;

use crate::models::request_params::DateRange;

/// A single daily bar (OHLCV).
///
/// This struct is vendor-agnostic and is used throughout the analysis pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    /// The trading day this bar covers, in the exchange's calendar.
    pub date: NaiveDate,

    /// Opening price.
    pub open: f64,

    /// Highest price during the day.
    pub high: f64,

    /// Lowest price during the day.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Volume traded during the day.
    pub volume: f64,
}

impl Bar {
    /// A bar where only the close is known; open/high/low mirror it.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        }
    }
}

/// The raw daily series for a single symbol.
///
/// Bars are strictly increasing by date. The only public constructor,
/// [`BarSeries::from_unordered`], sorts and de-duplicates so that holds for
/// any provider output.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    /// The symbol this data represents (e.g., "AAPL", "BTC-USD").
    pub symbol: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Builds a series from bars in any order.
    ///
    /// When two bars share a date the later one in `bars` wins, mirroring how
    /// a provider's corrected rows supersede earlier ones.
    pub fn from_unordered(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        // Stable sort keeps input order among equal dates, so the last
        // duplicate is the one we keep below.
        bars.sort_by_key(|b| b.date);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(prev) if prev.date == bar.date => *prev = bar,
                _ => deduped.push(bar),
            }
        }
        Self {
            symbol: symbol.into(),
            bars: deduped,
        }
    }

    /// An empty series; the pipeline reports these as insufficient data.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bars: Vec::new(),
        }
    }

    /// Drops bars outside `range`.
    pub fn restrict_to(mut self, range: &DateRange) -> Self {
        self.bars.retain(|b| range.contains(b.date));
        self
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Closing prices in date order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Dates in ascending order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }
}
