use chrono::NaiveDate;

use crate::errors::PipelineError;
use crate::indicators::{AugmentedSeries, IndicatorConfig};
use crate::stats;

/// Whole-period statistics for one instrument.
///
/// Independent of the rolling windows: `annualized_volatility` uses every
/// defined daily return, so it need not agree with the last rolling value.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRecord {
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    /// `close[last] / close[first] - 1`; undefined if the first close is not positive.
    pub total_return: Option<f64>,
    /// Mean of the defined daily returns.
    pub average_daily_return: Option<f64>,
    /// Std of the defined daily returns times the annualization factor.
    pub annualized_volatility: Option<f64>,
}

pub fn summarize(
    series: &AugmentedSeries,
    config: &IndicatorConfig,
) -> Result<SummaryRecord, PipelineError> {
    let (Some(first), Some(last)) = (series.rows().first(), series.rows().last()) else {
        return Err(PipelineError::InsufficientData {
            ticker: series.symbol.clone(),
        });
    };

    let (start_price, end_price) = (first.bar.close, last.bar.close);
    let total_return = (start_price.is_finite() && start_price > 0.0 && end_price.is_finite())
        .then(|| end_price / start_price - 1.0);

    let returns = series.defined_returns();
    let annualized_volatility =
        stats::std_dev(&returns, config.std_dev).map(|sd| sd * config.annualization_factor());

    Ok(SummaryRecord {
        first_date: first.bar.date,
        last_date: last.bar.date,
        total_return,
        average_daily_return: stats::mean(&returns),
        annualized_volatility,
    })
}
