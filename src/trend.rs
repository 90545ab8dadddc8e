//! Trend calculation between consecutive history entries

use crate::history::{History, HistoryEntry};
use crate::{Dimension, DimensionMap, Direction};
use serde::{Deserialize, Serialize};

/// Entries included in each dimension's trailing window and in charts
pub const TREND_WINDOW: usize = 10;
const CHART_HEIGHT: usize = 10;

/// One point of a dimension's trailing window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub timestamp: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendDatum {
    pub dimension: Dimension,
    pub current_score: f64,
    pub previous_score: Option<f64>,
    pub change: f64,
    pub direction: Direction,
    pub history: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendMetadata {
    pub history_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub timestamp: String,
    pub trends: DimensionMap<TrendDatum>,
    pub overall_trend: Direction,
    pub regressions: Vec<String>,
    pub improvements: Vec<String>,
    #[serde(default)]
    pub metadata: TrendMetadata,
}

impl TrendReport {
    /// Report used when there is no audit to compare
    pub fn empty(timestamp: String, note: Option<String>) -> Self {
        Self {
            timestamp,
            trends: DimensionMap::new(),
            overall_trend: Direction::Stable,
            regressions: Vec::new(),
            improvements: Vec::new(),
            metadata: TrendMetadata {
                history_length: 0,
                note,
            },
        }
    }

    /// Build the report from history that already holds the latest entry
    pub fn from_history(timestamp: String, history: &History) -> Self {
        let trends = compute_trends(&history.entries);
        let overall_trend = overall_direction(&trends);

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        for datum in trends.values() {
            match datum.direction {
                Direction::Worsening => regressions.push(change_line(datum)),
                Direction::Improving => improvements.push(change_line(datum)),
                Direction::Stable => {}
            }
        }

        Self {
            timestamp,
            trends,
            overall_trend,
            regressions,
            improvements,
            metadata: TrendMetadata {
                history_length: history.len(),
                note: None,
            },
        }
    }

    pub fn direction_of(&self, dimension: Dimension) -> Direction {
        self.trends
            .get(&dimension)
            .map(|t| t.direction)
            .unwrap_or(Direction::Stable)
    }
}

/// `"<dimension>: +N.N points"`
pub fn change_line(datum: &TrendDatum) -> String {
    format!("{}: {:+.1} points", datum.dimension, datum.change)
}

/// Per-dimension trends for every dimension of the newest entry
pub fn compute_trends(entries: &[HistoryEntry]) -> DimensionMap<TrendDatum> {
    let Some(latest) = entries.last() else {
        return DimensionMap::new();
    };
    let previous = entries.len().checked_sub(2).map(|i| &entries[i]);
    let window = &entries[entries.len().saturating_sub(TREND_WINDOW)..];

    latest
        .dimensions
        .iter()
        .map(|(dim, current)| {
            let previous_score = previous.and_then(|p| p.dimensions.get(dim).copied());
            let change = previous_score.map(|p| current - p).unwrap_or(0.0);
            let history = window
                .iter()
                .map(|e| TrendPoint {
                    timestamp: e.timestamp.clone(),
                    score: e.dimensions.get(dim).copied().unwrap_or(0.0),
                })
                .collect();
            (
                *dim,
                TrendDatum {
                    dimension: *dim,
                    current_score: *current,
                    previous_score,
                    change,
                    direction: Direction::from_change(change),
                    history,
                },
            )
        })
        .collect()
}

/// Majority vote of improving vs worsening; ties are stable
pub fn overall_direction(trends: &DimensionMap<TrendDatum>) -> Direction {
    let improving = trends
        .values()
        .filter(|t| t.direction == Direction::Improving)
        .count();
    let worsening = trends
        .values()
        .filter(|t| t.direction == Direction::Worsening)
        .count();

    match improving.cmp(&worsening) {
        std::cmp::Ordering::Greater => Direction::Improving,
        std::cmp::Ordering::Less => Direction::Worsening,
        std::cmp::Ordering::Equal => Direction::Stable,
    }
}

/// ASCII chart of the last entries' overall score or one dimension's score
pub fn render_chart(history: &History, dimension: Option<Dimension>) -> String {
    if history.len() < 2 {
        return "Not enough data for trend chart (need at least 2 data points)".to_string();
    }

    let window = history.tail(TREND_WINDOW);
    let (points, title): (Vec<f64>, String) = match dimension {
        Some(dim) => (
            window
                .iter()
                .map(|e| e.dimensions.get(&dim).copied().unwrap_or(0.0))
                .collect(),
            format!("Trend Chart: {}", dim),
        ),
        None => (
            window.iter().map(|e| e.overall_score).collect(),
            "Trend Chart: Overall Score".to_string(),
        ),
    };

    ascii_chart(&points, &title)
}

fn ascii_chart(points: &[f64], title: &str) -> String {
    let width = points.len();
    let min = points.iter().copied().fold(f64::INFINITY, f64::min);
    let max = points.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = if max > min { max - min } else { 1.0 };
    let top = (CHART_HEIGHT - 1) as f64;

    let rows: Vec<usize> = points
        .iter()
        .map(|v| ((v - min) / range * top) as usize)
        .collect();

    let mut lines = vec![title.to_string(), "=".repeat(width * 4)];
    for y in (0..CHART_HEIGHT).rev() {
        let mut line = format!("{:5.1} |", min + (y as f64 / top) * range);
        for &row in &rows {
            line.push_str(if row == y {
                " ● "
            } else if row > y {
                " │ "
            } else {
                "   "
            });
        }
        lines.push(line);
    }
    lines.push(format!("      {}", "─".repeat(width * 3)));
    lines.push(format!(
        "      {}",
        (1..=width).map(|i| format!(" {} ", i)).collect::<String>()
    ));

    lines.join("\n")
}
