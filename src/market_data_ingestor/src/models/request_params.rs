use chrono::NaiveDate;
use thiserror::Error;

/// Date format accepted on every user-facing surface.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("start date {start} must be earlier than end date {end}")]
    NotIncreasing { start: NaiveDate, end: NaiveDate },

    #[error("invalid date {input:?}, expected YYYY-MM-DD")]
    Format { input: String },
}

/// A daily history window: `start` inclusive, `end` exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Rejects equal or inverted ranges.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if start >= end {
            return Err(DateRangeError::NotIncreasing { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses two `YYYY-MM-DD` strings and validates their order.
    pub fn parse(start: &str, end: &str) -> Result<Self, DateRangeError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }
}

/// Parses a `YYYY-MM-DD` date, ignoring surrounding whitespace.
pub fn parse_date(input: &str) -> Result<NaiveDate, DateRangeError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|_| DateRangeError::Format {
        input: input.to_string(),
    })
}

/// Universal parameters for requesting daily history from any provider.
#[derive(Clone, Debug)]
pub struct BarsRequestParams {
    /// Symbol to request (e.g., `"AAPL"`, `"BTC-USD"`).
    pub symbol: String,

    /// The window of trading days to return.
    ///
    /// Providers should return bars on or after `range.start()` and strictly
    /// before `range.end()`.
    pub range: DateRange,
}

impl BarsRequestParams {
    pub fn new(symbol: impl Into<String>, range: DateRange) -> Self {
        Self {
            symbol: symbol.into(),
            range,
        }
    }
}
