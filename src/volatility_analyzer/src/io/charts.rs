//! Text charts for one analyzed ticker.
//!
//! The three views (price with moving averages, daily return, rolling
//! volatility) are plain data built by [`chart_views`]. [`TerminalChartRenderer`]
//! draws them with `ratatui` into an off-screen buffer and saves the result as
//! `<TICKER>_charts.txt`. Several tickers can also be compared on one
//! normalized price chart, saved as [`COMPARISON_FILE`].

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    symbols::Marker,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Widget},
};
use thiserror::Error;
use tracing::info;

use crate::indicators::{AugmentedRow, AugmentedSeries};

pub const DEFAULT_WIDTH: u16 = 100;
pub const DEFAULT_HEIGHT: u16 = 60;
pub const COMPARISON_FILE: &str = "comparison_charts.txt";

const LINE_COLORS: [Color; 3] = [Color::Cyan, Color::Yellow, Color::Magenta];

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("failed to write chart file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One named line; `x` is the row index in the series.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLine {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartView {
    pub title: String,
    pub y_title: String,
    /// First, middle and last date of the series.
    pub x_labels: Vec<String>,
    pub lines: Vec<ChartLine>,
}

impl ChartView {
    pub fn x_bounds(&self) -> [f64; 2] {
        let max_x = self
            .lines
            .iter()
            .flat_map(|l| l.points.iter().map(|p| p.0))
            .fold(0.0, f64::max);
        [0.0, max_x.max(1.0)]
    }

    /// Data range padded by 5%; `[0, 1]` when nothing is defined.
    pub fn y_bounds(&self) -> [f64; 2] {
        let (lo, hi) = self
            .lines
            .iter()
            .flat_map(|l| l.points.iter().map(|p| p.1))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
                (lo.min(y), hi.max(y))
            });
        if !lo.is_finite() || !hi.is_finite() {
            return [0.0, 1.0];
        }
        let pad = ((hi - lo) * 0.05).max(f64::EPSILON.max(hi.abs() * 1e-6));
        [lo - pad, hi + pad]
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.points.is_empty())
    }
}

fn line(
    name: impl Into<String>,
    rows: &[AugmentedRow],
    value: impl Fn(&AugmentedRow) -> Option<f64>,
) -> ChartLine {
    ChartLine {
        name: name.into(),
        points: rows
            .iter()
            .enumerate()
            .filter_map(|(i, r)| value(r).map(|v| (i as f64, v)))
            .collect(),
    }
}

/// Builds the price, return and volatility views. Undefined values are
/// left out; the volatility view is returned even if it has no points.
pub fn chart_views(series: &AugmentedSeries) -> [ChartView; 3] {
    let rows = series.rows();
    let x_labels: Vec<String> = match (rows.first(), rows.get(rows.len() / 2), rows.last()) {
        (Some(first), Some(mid), Some(last)) => [first, mid, last]
            .iter()
            .map(|r| r.bar.date.to_string())
            .collect(),
        _ => Vec::new(),
    };
    let (short, long) = (series.short_window, series.long_window);

    [
        ChartView {
            title: format!("{} close price", series.symbol),
            y_title: "Price".into(),
            x_labels: x_labels.clone(),
            lines: vec![
                line("close", rows, |r| Some(r.bar.close)),
                line(format!("ma{short}"), rows, |r| r.ma_short),
                line(format!("ma{long}"), rows, |r| r.ma_long),
            ],
        },
        ChartView {
            title: format!("{} daily return", series.symbol),
            y_title: "Return".into(),
            x_labels: x_labels.clone(),
            lines: vec![line("daily_return", rows, |r| r.daily_return)],
        },
        ChartView {
            title: format!("{} rolling volatility", series.symbol),
            y_title: "Volatility".into(),
            x_labels,
            lines: vec![
                line(format!("vol{short}"), rows, |r| r.vol_short),
                line(format!("vol{long}"), rows, |r| r.vol_long),
            ],
        },
    ]
}

/// Close prices divided by each ticker's first close, on a shared calendar.
///
/// `x` counts days from the earliest date in any series, so tickers that trade
/// on different days still line up. A series whose first close is not positive
/// gets a line with no points.
pub fn comparison_view<'a>(series: impl IntoIterator<Item = &'a AugmentedSeries>) -> ChartView {
    let series: Vec<&AugmentedSeries> = series.into_iter().collect();
    let dates = series.iter().flat_map(|s| s.rows().iter().map(|r| r.bar.date));
    let (first, last) = dates.fold((NaiveDate::MAX, NaiveDate::MIN), |(lo, hi), d| {
        (lo.min(d), hi.max(d))
    });

    let x_labels = if first <= last {
        let mid = first + chrono::Days::new(((last - first).num_days() / 2).unsigned_abs());
        vec![first.to_string(), mid.to_string(), last.to_string()]
    } else {
        Vec::new()
    };

    let lines = series
        .iter()
        .map(|s| {
            let base = s
                .rows()
                .first()
                .map(|r| r.bar.close)
                .filter(|c| c.is_finite() && *c > 0.0);
            ChartLine {
                name: s.symbol.clone(),
                points: base
                    .map(|base| {
                        s.rows()
                            .iter()
                            .map(|r| ((r.bar.date - first).num_days() as f64, r.bar.close / base))
                            .collect()
                    })
                    .unwrap_or_default(),
            }
        })
        .collect();

    ChartView {
        title: "Asset comparison".into(),
        y_title: "Normalized price".into(),
        x_labels,
        lines,
    }
}

pub trait ChartRenderer {
    /// Renders all views for one ticker and returns where they went.
    fn render(&self, series: &AugmentedSeries) -> Result<PathBuf, ChartError>;

    /// Renders one normalized price chart across tickers.
    fn render_comparison(&self, series: &[&AugmentedSeries]) -> Result<PathBuf, ChartError>;
}

/// Draws charts as Braille text and saves them next to the CSV output.
#[derive(Debug, Clone)]
pub struct TerminalChartRenderer {
    output_dir: PathBuf,
    width: u16,
    height: u16,
    echo: bool,
}

impl TerminalChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            echo: false,
        }
    }

    pub fn with_size(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Also print each rendered chart to stdout.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.output_dir.join(format!("{symbol}_charts.txt"))
    }

    /// The rendered charts as text, one line per terminal row.
    pub fn render_text(&self, series: &AugmentedSeries) -> String {
        let area = Rect::new(0, 0, self.width, self.height);
        let mut buffer = Buffer::empty(area);
        let panes = Layout::vertical([Constraint::Ratio(1, 3); 3]).split(area);

        let views = chart_views(series);
        for (view, pane) in views.iter().zip(panes.iter()) {
            draw_view(view, *pane, &mut buffer);
        }
        buffer_to_text(&buffer)
    }

    pub fn comparison_text(&self, series: &[&AugmentedSeries]) -> String {
        let area = Rect::new(0, 0, self.width, self.height / 3);
        let mut buffer = Buffer::empty(area);
        draw_view(&comparison_view(series.iter().copied()), area, &mut buffer);
        buffer_to_text(&buffer)
    }
}

impl ChartRenderer for TerminalChartRenderer {
    fn render(&self, series: &AugmentedSeries) -> Result<PathBuf, ChartError> {
        let text = self.render_text(series);
        let path = self.path_for(&series.symbol);
        write_text(&self.output_dir, &path, &text)?;
        info!(path = %path.display(), "charts saved");
        if self.echo {
            println!("{text}");
        }
        Ok(path)
    }

    fn render_comparison(&self, series: &[&AugmentedSeries]) -> Result<PathBuf, ChartError> {
        let text = self.comparison_text(series);
        let path = self.output_dir.join(COMPARISON_FILE);
        write_text(&self.output_dir, &path, &text)?;
        info!(path = %path.display(), tickers = series.len(), "comparison chart saved");
        if self.echo {
            println!("{text}");
        }
        Ok(path)
    }
}

fn draw_view(view: &ChartView, area: Rect, buffer: &mut Buffer) {
    let datasets: Vec<Dataset> = view
        .lines
        .iter()
        .zip(LINE_COLORS.iter().cycle())
        .map(|(l, color)| {
            Dataset::default()
                .name(l.name.clone())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(*color))
                .data(&l.points)
        })
        .collect();

    let [y_min, y_max] = view.y_bounds();
    let title = if view.is_empty() {
        format!(" {} (not enough data) ", view.title)
    } else {
        format!(" {} ", view.title)
    };

    Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(title))
        .x_axis(
            Axis::default()
                .title("Date")
                .bounds(view.x_bounds())
                .labels(view.x_labels.clone()),
        )
        .y_axis(
            Axis::default()
                .title(view.y_title.clone())
                .bounds([y_min, y_max])
                .labels(vec![
                    format!("{y_min:.3}"),
                    format!("{:.3}", (y_min + y_max) / 2.0),
                    format!("{y_max:.3}"),
                ]),
        )
        .render(area, buffer);
}

fn buffer_to_text(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut out = String::with_capacity(usize::from(area.width + 1) * usize::from(area.height));
    for y in area.top()..area.bottom() {
        let row: String = (area.left()..area.right())
            .map(|x| buffer[(x, y)].symbol())
            .collect();
        out.push_str(row.trim_end());
        out.push('\n');
    }
    out
}

fn write_text(dir: &Path, path: &Path, text: &str) -> Result<(), ChartError> {
    fs::create_dir_all(dir).map_err(|source| ChartError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    fs::write(path, text).map_err(|source| ChartError::Io {
        path: path.to_path_buf(),
        source,
    })
}
