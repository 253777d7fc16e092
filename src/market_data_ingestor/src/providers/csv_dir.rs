//! Offline provider backed by a directory of per-symbol CSV exports.
//!
//! Each symbol lives in `<data_dir>/<SYMBOL>.csv` (a lowercase file name is
//! accepted too). The layout is loose on purpose so exports from different
//! sites load without massaging: the date column is matched case-insensitively
//! and the price column may be called `Close` or `Price`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use snafu::ResultExt;
use tracing::debug;

use crate::models::{
    bar::{Bar, BarSeries},
    request_params::{BarsRequestParams, DATE_FORMAT},
};
use crate::providers::{
    DataProvider, InvalidTickerSnafu, IoSnafu, MalformedSnafu, NoDataSnafu, ProviderError,
};

const PRICE_COLUMNS: [&str; 4] = ["Close", "close", "Price", "price"];

pub struct CsvDirProvider {
    data_dir: PathBuf,
}

/// Column positions resolved from the header row.
struct Columns {
    date: usize,
    close: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    volume: Option<usize>,
}

impl Columns {
    fn resolve(symbol: &str, headers: &StringRecord) -> Result<Self, ProviderError> {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

        let Some(date) = find("date") else {
            return MalformedSnafu {
                symbol,
                message: "no 'Date' column found",
            }
            .fail();
        };
        let close = PRICE_COLUMNS
            .iter()
            .find_map(|name| headers.iter().position(|h| h == *name));
        let Some(close) = close else {
            return MalformedSnafu {
                symbol,
                message: "no price column found (expected 'Close' or 'Price')",
            }
            .fail();
        };

        Ok(Self {
            date,
            close,
            open: find("open"),
            high: find("high"),
            low: find("low"),
            volume: find("volume"),
        })
    }
}

impl CsvDirProvider {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn locate(&self, symbol: &str) -> Option<PathBuf> {
        [symbol.to_string(), symbol.to_lowercase()]
            .into_iter()
            .map(|stem| self.data_dir.join(format!("{stem}.csv")))
            .find(|path| path.is_file())
    }

    /// Reads and filters one symbol's file.
    pub fn load(&self, params: &BarsRequestParams) -> Result<BarSeries, ProviderError> {
        let symbol = params.symbol.as_str();
        let Some(path) = self.locate(symbol) else {
            return InvalidTickerSnafu { symbol }.fail();
        };
        debug!(path = %path.display(), "reading csv history");

        let file = std::fs::File::open(&path).context(IoSnafu { path: path.clone() })?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(file);

        let headers = reader.headers().map_err(|e| csv_error(symbol, e))?.clone();
        let columns = Columns::resolve(symbol, &headers)?;

        let mut bars = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| csv_error(symbol, e))?;
            let raw_date = record.get(columns.date).unwrap_or_default();
            let Some(date) = parse_row_date(raw_date) else {
                return MalformedSnafu {
                    symbol,
                    message: format!("row {}: unparsable date {raw_date:?}", line + 2),
                }
                .fail();
            };
            // Unparsable prices are dropped rather than failing the file.
            let Some(close) = number_at(&record, Some(columns.close)) else {
                continue;
            };
            bars.push(Bar {
                date,
                open: number_at(&record, columns.open).unwrap_or(close),
                high: number_at(&record, columns.high).unwrap_or(close),
                low: number_at(&record, columns.low).unwrap_or(close),
                close,
                volume: number_at(&record, columns.volume).unwrap_or(0.0),
            });
        }

        let series = BarSeries::from_unordered(symbol, bars).restrict_to(&params.range);
        if series.is_empty() {
            return NoDataSnafu { symbol }.fail();
        }
        Ok(series)
    }
}

#[async_trait]
impl DataProvider for CsvDirProvider {
    async fn fetch_bars(&self, params: &BarsRequestParams) -> Result<BarSeries, ProviderError> {
        self.load(params)
    }
}

fn csv_error(symbol: &str, err: csv::Error) -> ProviderError {
    MalformedSnafu {
        symbol,
        message: err.to_string(),
    }
    .build()
}

/// Accepts `YYYY-MM-DD` with an optional time suffix (`2024-01-02 00:00:00+00:00`).
fn parse_row_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, DATE_FORMAT).ok()
}

fn number_at(record: &StringRecord, idx: Option<usize>) -> Option<f64> {
    record
        .get(idx?)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
