use std::path::PathBuf;

use clap::Parser;

use crate::config::{AnalysisConfig, SourceKind};

/// Downloads daily prices, derives return and volatility indicators, and
/// writes CSV files, charts and a summary report.
///
/// Anything not given on the command line is asked for on the console.
#[derive(Debug, Parser)]
#[command(author, version)]
pub struct Cli {
    /// Path to a TOML config file (defaults to $VOLATILITY_ANALYZER_CONFIG)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Comma-separated list of symbols (e.g. "BTC-USD,AAPL")
    #[arg(long)]
    pub tickers: Option<String>,

    /// First day to include, YYYY-MM-DD
    #[arg(long)]
    pub start: Option<String>,

    /// Day after the last one to include, YYYY-MM-DD
    #[arg(long)]
    pub end: Option<String>,

    /// Where prices come from
    #[arg(long, value_enum)]
    pub source: Option<SourceKind>,

    /// Directory of <TICKER>.csv files for the csv_dir source
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory for CSV and chart output
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Ticker to compute beta against (e.g. "SPY")
    #[arg(long, value_name = "TICKER")]
    pub benchmark: Option<String>,

    /// Skip writing chart files
    #[arg(long, conflicts_with = "show_charts")]
    pub no_charts: bool,

    /// Print charts to stdout as well as saving them
    #[arg(long)]
    pub show_charts: bool,
}

impl Cli {
    /// Command-line flags win over file settings.
    pub fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(kind) = self.source {
            config.source.kind = kind;
        }
        if let Some(dir) = &self.data_dir {
            config.source.data_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(symbol) = &self.benchmark {
            config.risk.benchmark = Some(symbol.trim().to_uppercase());
        }
        if self.no_charts {
            config.output.charts = false;
        }
        if self.show_charts {
            config.output.charts = true;
            config.output.show_charts = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "volatility-analyzer",
            "--tickers",
            "AAPL,MSFT",
            "--source",
            "csv_dir",
            "--data-dir",
            "fixtures",
            "--no-charts",
            "--benchmark",
            "spy",
        ])
        .unwrap();
        let mut config = AnalysisConfig::default();
        cli.apply(&mut config);
        assert_eq!(cli.tickers.as_deref(), Some("AAPL,MSFT"));
        assert_eq!(config.source.kind, SourceKind::CsvDir);
        assert_eq!(config.source.data_dir, PathBuf::from("fixtures"));
        assert!(!config.output.charts);
        assert_eq!(config.risk.benchmark.as_deref(), Some("SPY"));
    }

    #[test]
    fn no_flags_leave_config_alone() {
        let cli = Cli::try_parse_from(["volatility-analyzer"]).unwrap();
        let mut config = AnalysisConfig::default();
        cli.apply(&mut config);
        assert_eq!(config, AnalysisConfig::default());
        assert!(cli.start.is_none());
    }

    #[test]
    fn chart_flags_conflict() {
        assert!(Cli::try_parse_from(["volatility-analyzer", "--no-charts", "--show-charts"]).is_err());
    }
}
