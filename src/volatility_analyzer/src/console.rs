use std::io::{self, BufRead, Write};

use crate::{errors::PipelineError, risk::RiskMetrics, summary::SummaryRecord};

pub const TICKERS_PROMPT: &str = "Enter ticker symbols (comma-separated, e.g. BTC-USD,ETH-USD,AAPL): ";
pub const START_PROMPT: &str = "Enter start date (YYYY-MM-DD): ";
pub const END_PROMPT: &str = "Enter end date   (YYYY-MM-DD): ";

/// Raw answers from the interactive prompt, trimmed but not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    pub tickers: String,
    pub start: String,
    pub end: String,
}

/// Asks for tickers, start date and end date, in that order.
pub fn prompt_request<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
) -> io::Result<RawRequest> {
    prompt_missing(reader, writer, None, None, None)
}

/// Like [`prompt_request`], but only asks for the answers not already given.
pub fn prompt_missing<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    tickers: Option<String>,
    start: Option<String>,
    end: Option<String>,
) -> io::Result<RawRequest> {
    let mut answer = |given: Option<String>, prompt: &str| match given {
        Some(value) => Ok(value),
        None => ask(reader, writer, prompt),
    };
    Ok(RawRequest {
        tickers: answer(tickers, TICKERS_PROMPT)?,
        start: answer(start, START_PROMPT)?,
        end: answer(end, END_PROMPT)?,
    })
}

fn ask<R: BufRead, W: Write>(reader: &mut R, writer: &mut W, prompt: &str) -> io::Result<String> {
    write!(writer, "{prompt}")?;
    writer.flush()?;
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed before all answers were given",
        ));
    }
    Ok(line.trim().to_string())
}

fn percent(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.precision$}%", v * 100.0),
        None => "n/a".to_string(),
    }
}

/// The per-ticker block of the summary report.
pub fn format_summary(ticker: &str, summary: &SummaryRecord, risk: &RiskMetrics) -> String {
    let volatility = match summary.annualized_volatility {
        Some(v) => format!("{:.2}%", v * 100.0),
        None => "Not enough data".to_string(),
    };

    let mut block = format!(
        "Ticker: {ticker}\n\
         \x20 First Date           : {}\n\
         \x20 Last Date            : {}\n\
         \x20 Total Return         : {}\n\
         \x20 Avg Daily Return     : {}\n\
         \x20 Annualized Volatility: {volatility}\n\
         \x20 Sharpe Ratio         : {:.3}\n\
         \x20 Historical VaR       : {:.2}%\n",
        summary.first_date,
        summary.last_date,
        percent(summary.total_return, 2),
        percent(summary.average_daily_return, 4),
        risk.sharpe_ratio,
        risk.value_at_risk * 100.0,
    );
    if let Some(beta) = risk.beta {
        block.push_str(&format!("  Beta                 : {beta:.3}\n"));
    }
    block
}

pub fn format_failure(ticker: &str, err: &PipelineError) -> String {
    format!("Ticker: {ticker}\n  [{}] {err}\n", err.kind())
}
