use std::fs;

use chrono::NaiveDate;
use market_data_ingestor::providers::csv_dir::CsvDirProvider;
use tempfile::TempDir;
use volatility_analyzer::{
    config::AnalysisConfig,
    io::{
        charts::{ChartRenderer, TerminalChartRenderer},
        sink::{CsvFileSink, DataSink, write_combined_closes},
    },
    pipeline::{BatchRequest, run_batch},
};

const HEADER: &str = "date,open,high,low,close,volume,daily_return,ma20,ma50,vol20,vol50";

/// Writes `days` rows of a gently trending series starting 2024-01-01.
fn write_prices(dir: &TempDir, symbol: &str, days: u32) {
    let mut body = String::from("Date,Open,High,Low,Close,Volume\n");
    for i in 0..days {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i.into());
        let close = 100.0 + f64::from(i) * 0.5 + if i % 3 == 0 { 1.0 } else { 0.0 };
        body.push_str(&format!(
            "{date},{o},{h},{l},{close},{v}\n",
            o = close - 0.2,
            h = close + 1.0,
            l = close - 1.0,
            v = 1000 + i,
        ));
    }
    fs::write(dir.path().join(format!("{symbol}.csv")), body).unwrap();
}

fn full_year() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
    )
}

#[tokio::test]
async fn csv_directory_batch_end_to_end() {
    let data = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_prices(&data, "ABC", 60);
    write_prices(&data, "XYZ", 10);

    let (start, end) = full_year();
    let provider = CsvDirProvider::new(data.path());
    let request = BatchRequest {
        tickers: vec!["ABC".into(), "MISSING".into(), "XYZ".into()],
        start,
        end,
    };
    let report = run_batch(&provider, &request, &AnalysisConfig::default()).await;
    assert_eq!(report.success_count(), 2);
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.failed().next().unwrap().1.kind(), "InvalidTicker");

    let sink = CsvFileSink::new(out.path().join("nested"));
    for (_, ok) in report.succeeded() {
        sink.write(&ok.augmented).await.unwrap();
    }

    let abc = fs::read_to_string(out.path().join("nested/ABC_historical.csv")).unwrap();
    let lines: Vec<&str> = abc.lines().collect();
    assert_eq!(lines[0], HEADER);
    assert_eq!(lines.len(), 61);
    assert!(lines[1].starts_with("2024-01-01,"));
    // Row 0 has no return and no rolling values.
    assert!(lines[1].ends_with(",,,,,"));
    // By row 50 every derived column is defined.
    assert!(lines[51].split(',').all(|cell| !cell.is_empty()));

    let xyz = fs::read_to_string(sink.path_for("XYZ")).unwrap();
    assert_eq!(xyz.lines().count(), 11);

    let combined =
        write_combined_closes(out.path(), report.succeeded().map(|(_, r)| &r.augmented)).unwrap();
    let combined = fs::read_to_string(combined).unwrap();
    assert_eq!(combined.lines().count(), 1 + 60 + 10);
    assert!(combined.lines().last().unwrap().ends_with(",XYZ"));

    let renderer = TerminalChartRenderer::new(out.path());
    for (ticker, ok) in report.succeeded() {
        let path = renderer.render(&ok.augmented).unwrap();
        assert!(path.ends_with(format!("{ticker}_charts.txt")));
    }
    let all: Vec<_> = report.succeeded().map(|(_, r)| &r.augmented).collect();
    let comparison = renderer.render_comparison(&all).unwrap();
    assert!(fs::read_to_string(comparison).unwrap().contains("Asset comparison"));
}

#[tokio::test]
async fn existing_output_is_overwritten() {
    let data = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_prices(&data, "ABC", 25);
    fs::write(out.path().join("ABC_historical.csv"), "stale\n".repeat(500)).unwrap();

    let (start, end) = full_year();
    let provider = CsvDirProvider::new(data.path());
    let request = BatchRequest {
        tickers: vec!["ABC".into()],
        start,
        end,
    };
    let report = run_batch(&provider, &request, &AnalysisConfig::default()).await;
    let (_, ok) = report.succeeded().next().unwrap();
    let path = CsvFileSink::new(out.path()).write(&ok.augmented).await.unwrap();

    let text = fs::read_to_string(path).unwrap();
    assert!(!text.contains("stale"));
    assert_eq!(text.lines().count(), 26);
}

#[tokio::test]
async fn configured_windows_rename_the_columns() {
    let data = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_prices(&data, "ABC", 12);

    let mut config = AnalysisConfig::default();
    config.indicators.short_window = 5;
    config.indicators.long_window = 10;

    let (start, end) = full_year();
    let request = BatchRequest {
        tickers: vec!["ABC".into()],
        start,
        end,
    };
    let report = run_batch(&CsvDirProvider::new(data.path()), &request, &config).await;
    let (_, ok) = report.succeeded().next().unwrap();
    let path = CsvFileSink::new(out.path()).write(&ok.augmented).await.unwrap();

    let text = fs::read_to_string(path).unwrap();
    assert!(text.starts_with("date,open,high,low,close,volume,daily_return,ma5,ma10,vol5,vol10\n"));
}
