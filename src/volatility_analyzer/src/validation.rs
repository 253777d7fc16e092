use chrono::NaiveDate;
use indexmap::IndexSet;
use market_data_ingestor::models::{bar::BarSeries, request_params::DateRange};

use crate::errors::PipelineError;

/// Splits a comma-separated ticker list.
///
/// Symbols are trimmed and uppercased; empty entries and repeats are dropped,
/// keeping the first occurrence.
pub fn parse_tickers(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// Start must be strictly before end.
pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<DateRange, PipelineError> {
    Ok(DateRange::new(start, end)?)
}

pub fn ensure_rows(series: &BarSeries) -> Result<(), PipelineError> {
    if series.is_empty() {
        return Err(PipelineError::InsufficientData {
            ticker: series.symbol.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use market_data_ingestor::models::request_params::DateRangeError;

    use super::*;

    #[test]
    fn tickers_are_normalized() {
        assert_eq!(
            parse_tickers(" aapl, msft ,,AAPL, btc-usd "),
            vec!["AAPL", "MSFT", "BTC-USD"]
        );
        assert!(parse_tickers(" , ").is_empty());
    }

    #[test]
    fn equal_dates_are_rejected() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = validate_range(day, day).unwrap_err();
        assert_eq!(err.kind(), "InvalidDateRange");
        assert!(matches!(
            err,
            PipelineError::InvalidDateRange(DateRangeError::NotIncreasing { .. })
        ));
    }

    #[test]
    fn ordered_dates_become_a_range() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let range = validate_range(start, end).unwrap();
        assert_eq!((range.start(), range.end()), (start, end));
        assert!(validate_range(end, start).is_err());
    }

    #[test]
    fn empty_series_has_no_rows() {
        let err = ensure_rows(&BarSeries::empty("GONE")).unwrap_err();
        assert_eq!(err.kind(), "InsufficientData");
    }
}
