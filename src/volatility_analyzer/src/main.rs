use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use market_data_ingestor::{
    models::request_params::parse_date,
    providers::{DataProvider, csv_dir::CsvDirProvider, yahoo_chart::YahooChartProvider},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use volatility_analyzer::{
    cli::Cli,
    config::{AnalysisConfig, SourceKind},
    console::{format_failure, format_summary, prompt_missing},
    io::{
        charts::{ChartRenderer, TerminalChartRenderer},
        sink::{CsvFileSink, DataSink, write_combined_closes},
    },
    pipeline::{BatchReport, BatchRequest, run_batch},
    validation::parse_tickers,
};

fn build_provider(config: &AnalysisConfig) -> Result<Box<dyn DataProvider>> {
    let provider: Box<dyn DataProvider> = match config.source.kind {
        SourceKind::Yahoo => {
            let yahoo = config.source.yahoo_config().with_env_overrides()?;
            info!(base_url = %yahoo.base_url, "using Yahoo chart source");
            Box::new(YahooChartProvider::new(yahoo).context("building HTTP client")?)
        }
        SourceKind::CsvDir => {
            info!(dir = %config.source.data_dir.display(), "using CSV directory source");
            Box::new(CsvDirProvider::new(&config.source.data_dir))
        }
    };
    Ok(provider)
}

async fn persist(report: &BatchReport, config: &AnalysisConfig) {
    let sink = CsvFileSink::new(&config.output.dir);
    for (ticker, result) in report.succeeded() {
        match sink.write(&result.augmented).await {
            Ok(path) => println!("[SAVE] Data for '{ticker}' saved to '{}'.", path.display()),
            Err(err) => warn!(ticker, "failed to save historical data: {err}"),
        }
    }

    if config.output.combined_csv && report.success_count() > 0 {
        let series = report.succeeded().map(|(_, r)| &r.augmented);
        if let Err(err) = write_combined_closes(&config.output.dir, series) {
            warn!("failed to save combined closes: {err}");
        }
    }
}

fn print_report(report: &BatchReport) {
    println!("\n================ SUMMARY REPORT ================");
    for outcome in &report.outcomes {
        let block = match &outcome.result {
            Ok(r) => format_summary(&outcome.ticker, &r.summary, &r.risk),
            Err(err) => format_failure(&outcome.ticker, err),
        };
        println!("\n{block}");
    }
    println!(
        "{} succeeded, {} failed",
        report.success_count(),
        report.failure_count()
    );
}

fn render_charts(report: &BatchReport, config: &AnalysisConfig) {
    if !config.output.charts {
        return;
    }
    let renderer =
        TerminalChartRenderer::new(&config.output.dir).with_echo(config.output.show_charts);
    for (ticker, result) in report.succeeded() {
        if let Err(err) = renderer.render(&result.augmented) {
            warn!(ticker, "failed to render charts: {err}");
        }
    }

    let all: Vec<_> = report.succeeded().map(|(_, r)| &r.augmented).collect();
    if all.len() > 1 {
        if let Err(err) = renderer.render_comparison(&all) {
            warn!("failed to render comparison chart: {err}");
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AnalysisConfig::resolve(cli.config.as_deref())?;
    cli.apply(&mut config);

    let raw = {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let raw = prompt_missing(
            &mut stdin.lock(),
            &mut stdout,
            cli.tickers.clone(),
            cli.start.clone(),
            cli.end.clone(),
        )
        .context("reading request from console")?;
        stdout.flush()?;
        raw
    };

    let tickers = parse_tickers(&raw.tickers);
    if tickers.is_empty() {
        eprintln!("[ERROR] No tickers provided. Exiting.");
        return Ok(());
    }
    let (start, end) = match (parse_date(&raw.start), parse_date(&raw.end)) {
        (Ok(start), Ok(end)) => (start, end),
        (Err(err), _) | (_, Err(err)) => {
            eprintln!("[ERROR] {err}");
            return Ok(());
        }
    };

    let provider = build_provider(&config)?;
    let request = BatchRequest {
        tickers,
        start,
        end,
    };
    let report = run_batch(provider.as_ref(), &request, &config).await;

    persist(&report, &config).await;
    print_report(&report);
    render_charts(&report, &config);
    Ok(())
}
