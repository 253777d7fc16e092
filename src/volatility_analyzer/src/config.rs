//! Run configuration, loaded from an optional TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working setup:
//!
//! ```toml
//! [indicators]
//! short_window = 20
//! long_window = 50
//! trading_days = 252
//! std_dev = "sample"
//!
//! [risk]
//! risk_free_rate = 0.01
//! var_level = 0.05
//! benchmark = "SPY"      # optional, enables beta
//!
//! [source]
//! kind = "yahoo"          # or "csv_dir"
//! data_dir = "data"
//!
//! [output]
//! dir = "."
//! charts = true
//! show_charts = false
//! combined_csv = true
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use market_data_ingestor::providers::yahoo_chart::YahooChartConfig;
use serde::{Deserialize, Serialize};
use shared_utils::env::get_env_override;
use thiserror::Error;

use crate::{indicators::IndicatorConfig, risk::RiskConfig};

/// Names a config file to use when `--config` is not given.
pub const CONFIG_PATH_ENV: &str = "VOLATILITY_ANALYZER_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub indicators: IndicatorConfig,
    pub risk: RiskConfig,
    pub source: SourceConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum SourceKind {
    /// Yahoo Finance chart endpoint.
    #[default]
    Yahoo,
    /// `<TICKER>.csv` files in a local directory.
    CsvDir,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub data_dir: PathBuf,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Yahoo,
            data_dir: PathBuf::from("data"),
            base_url: None,
            timeout_secs: None,
        }
    }
}

impl SourceConfig {
    /// File settings layered over the Yahoo defaults. Environment overrides
    /// are applied later, when the provider is built.
    pub fn yahoo_config(&self) -> YahooChartConfig {
        let mut config = YahooChartConfig::default();
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Write `<TICKER>_charts.txt` for each successful ticker.
    pub charts: bool,
    /// Also print the charts to stdout.
    pub show_charts: bool,
    /// Write `combined_close.csv` across all successful tickers.
    pub combined_csv: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            charts: true,
            show_charts: false,
            combined_csv: true,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(path, &contents)
    }

    /// Loads `path`, else the file named by `VOLATILITY_ANALYZER_CONFIG`, else defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path
            .map(Path::to_path_buf)
            .or_else(|| get_env_override(CONFIG_PATH_ENV).map(PathBuf::from))
        {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::stats::StdDevKind;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AnalysisConfig::from_toml_str(Path::new("empty.toml"), "").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.indicators.short_window, 20);
        assert_eq!(config.indicators.long_window, 50);
        assert!(config.output.charts);
        assert!(!config.output.show_charts);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let toml = r#"
            [indicators]
            std_dev = "population"

            [risk]
            benchmark = "SPY"

            [source]
            kind = "csv_dir"
            data_dir = "prices"
            timeout_secs = 5
        "#;
        let config = AnalysisConfig::from_toml_str(Path::new("x.toml"), toml).unwrap();
        assert_eq!(config.indicators.std_dev, StdDevKind::Population);
        assert_eq!(config.indicators.trading_days, 252.0);
        assert_eq!(config.source.kind, SourceKind::CsvDir);
        assert_eq!(config.source.data_dir, PathBuf::from("prices"));
        assert_eq!(config.source.yahoo_config().timeout, Duration::from_secs(5));
        assert_eq!(config.risk.benchmark.as_deref(), Some("SPY"));
        assert_eq!(config.risk.var_level, RiskConfig::default().var_level);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AnalysisConfig::from_toml_str(Path::new("bad.toml"), "[output]\ncolour = true")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\ndir = \"out\"\ncombined_csv = false").unwrap();
        let config = AnalysisConfig::load(file.path()).unwrap();
        assert_eq!(config.output.dir, PathBuf::from("out"));
        assert!(!config.output.combined_csv);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = AnalysisConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
