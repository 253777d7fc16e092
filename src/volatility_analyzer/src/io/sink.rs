use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use market_data_ingestor::models::request_params::DATE_FORMAT;
use polars::prelude::*;
use polars_io::SerWriter;
use thiserror::Error;
use tracing::info;

use crate::indicators::{AugmentedRow, AugmentedSeries};

pub const COMBINED_CLOSE_FILE: &str = "combined_close.csv";

#[derive(Debug, Error)]
pub enum SinkError {
    /// Creating the output directory or file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Building or serializing the frame failed.
    #[error("data frame error: {0}")]
    Frame(#[from] PolarsError),
}

#[async_trait]
pub trait DataSink {
    /// What a successful write hands back, e.g. the path of the created file.
    type Output;

    async fn write(&self, series: &AugmentedSeries) -> Result<Self::Output, SinkError>;
}

/// Writes one `<TICKER>_historical.csv` per series into `output_dir`.
#[derive(Debug, Clone)]
pub struct CsvFileSink {
    output_dir: PathBuf,
}

impl CsvFileSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.output_dir.join(format!("{symbol}_historical.csv"))
    }
}

#[async_trait]
impl DataSink for CsvFileSink {
    type Output = PathBuf;

    async fn write(&self, series: &AugmentedSeries) -> Result<PathBuf, SinkError> {
        let mut frame = augmented_frame(series)?;
        let path = self.path_for(&series.symbol);
        write_csv(&self.output_dir, &path, &mut frame)?;
        info!(rows = frame.height(), path = %path.display(), "historical data saved");
        Ok(path)
    }
}

/// Column names for the derived fields, e.g. `ma20` and `vol50`.
pub fn indicator_columns(series: &AugmentedSeries) -> [String; 4] {
    [
        format!("ma{}", series.short_window),
        format!("ma{}", series.long_window),
        format!("vol{}", series.short_window),
        format!("vol{}", series.long_window),
    ]
}

/// The augmented series as a frame; undefined values become nulls.
pub fn augmented_frame(series: &AugmentedSeries) -> PolarsResult<DataFrame> {
    let rows = series.rows();
    let pick = |f: fn(&AugmentedRow) -> f64| rows.iter().map(f).collect::<Vec<_>>();
    let pick_opt = |f: fn(&AugmentedRow) -> Option<f64>| rows.iter().map(f).collect::<Vec<_>>();
    let [ma_short, ma_long, vol_short, vol_long] = indicator_columns(series);

    df!(
        "date" => rows.iter().map(|r| r.bar.date.format(DATE_FORMAT).to_string()).collect::<Vec<_>>(),
        "open" => pick(|r| r.bar.open),
        "high" => pick(|r| r.bar.high),
        "low" => pick(|r| r.bar.low),
        "close" => pick(|r| r.bar.close),
        "volume" => pick(|r| r.bar.volume),
        "daily_return" => pick_opt(|r| r.daily_return),
        ma_short.as_str() => pick_opt(|r| r.ma_short),
        ma_long.as_str() => pick_opt(|r| r.ma_long),
        vol_short.as_str() => pick_opt(|r| r.vol_short),
        vol_long.as_str() => pick_opt(|r| r.vol_long)
    )
}

/// Writes `date, close, ticker` rows for every series into one long file.
pub fn write_combined_closes<'a>(
    output_dir: &Path,
    series: impl IntoIterator<Item = &'a AugmentedSeries>,
) -> Result<PathBuf, SinkError> {
    let (mut dates, mut closes, mut tickers) = (Vec::new(), Vec::new(), Vec::new());
    for s in series {
        for row in s.rows() {
            dates.push(row.bar.date.format(DATE_FORMAT).to_string());
            closes.push(row.bar.close);
            tickers.push(s.symbol.clone());
        }
    }

    let mut frame = df!(
        "date" => dates,
        "close" => closes,
        "ticker" => tickers
    )?;
    let path = output_dir.join(COMBINED_CLOSE_FILE);
    write_csv(output_dir, &path, &mut frame)?;
    info!(rows = frame.height(), path = %path.display(), "combined closes saved");
    Ok(path)
}

fn write_csv(dir: &Path, path: &Path, frame: &mut DataFrame) -> Result<(), SinkError> {
    let io_err = |source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    };
    fs::create_dir_all(dir).map_err(|source| SinkError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut file = File::create(path).map_err(io_err)?;
    CsvWriter::new(&mut file).include_header(true).finish(frame)?;
    Ok(())
}
