#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Training log analysis and reward ablations.
//!
//! The trainer writes one line per episode to stdout. This crate reads those
//! logs back: it extracts the per-episode totals, summarizes a run, and
//! compiles a directory of runs into one episode-indexed CSV table. The
//! [`ablation`] module holds the reward presets the ablation runner cycles
//! through.
//!
//! Analysis never fails on a bad line. A value that does not parse is kept
//! as a missing entry so episode indices stay aligned across runs.

pub mod ablation;

use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Marker that identifies an episode line.
pub const REWARD_MARKER: &str = "Total reward";
/// Placeholder printed for episodes that ended early.
pub const MISSING_REWARD: &str = "n/a";
/// File extension of training logs inside a log directory.
pub const LOG_EXTENSION: &str = "txt";

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown ablation preset '{name}', valid: {}", valid.join(", "))]
    UnknownPreset { name: String, valid: Vec<String> },
}

pub type Result<T> = std::result::Result<T, FeedbackError>;

/// Formats the log line for one episode.
///
/// `total` is `None` for a failed episode; the line then reads `n/a` and is
/// counted as missing when parsed back.
#[must_use]
pub fn format_episode_line(episode: usize, episodes: usize, total: Option<f64>) -> String {
    match total {
        Some(total) => format!("Episode {episode}/{episodes} | {REWARD_MARKER}: {total:.2}"),
        None => format!("Episode {episode}/{episodes} | {REWARD_MARKER}: {MISSING_REWARD}"),
    }
}

/// Returns `true` if `line` carries an episode total.
#[must_use]
pub fn is_reward_line(line: &str) -> bool {
    line.contains(REWARD_MARKER)
}

/// Value after the last colon of an episode line, or `None` if it is not a
/// finite number.
#[must_use]
pub fn parse_reward_line(line: &str) -> Option<f64> {
    let raw = line.trim().rsplit(':').next()?;
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// All episode totals in a log, in order. Unparseable values become `None`.
#[must_use]
pub fn parse_rewards(log: &str) -> Vec<Option<f64>> {
    log.lines()
        .filter(|line| is_reward_line(line))
        .map(parse_reward_line)
        .collect()
}

/// Reads a log file and extracts its episode totals.
pub fn read_rewards(path: &Path) -> Result<Vec<Option<f64>>> {
    let text = fs::read_to_string(path).map_err(|source| FeedbackError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_rewards(&text))
}

/// Statistics of one run over its parseable totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Number of parseable totals.
    pub count: usize,
    /// Number of episode lines without a usable value.
    pub missing: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n − 1); needs at least two values.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl RunSummary {
    #[must_use]
    pub fn from_rewards(rewards: &[Option<f64>]) -> Self {
        let values: Vec<f64> = rewards.iter().flatten().copied().collect();
        let missing = rewards.len() - values.len();
        if values.is_empty() {
            return Self {
                missing,
                ..Self::default()
            };
        }

        #[allow(clippy::cast_precision_loss)]
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = (values.len() > 1).then(|| {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        });

        Self {
            count: values.len(),
            missing,
            mean: Some(mean),
            std,
            min: values.iter().copied().reduce(f64::min),
            max: values.iter().copied().reduce(f64::max),
        }
    }

    /// Share of episode lines that carried a value.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        let total = self.count + self.missing;
        if total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.count as f64 / total as f64
        }
    }
}

/// Per-episode totals of several runs, one column per log file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewardTable {
    columns: Vec<(String, Vec<Option<f64>>)>,
}

impl RewardTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a run; the label becomes the CSV column header.
    pub fn push(&mut self, label: impl Into<String>, rewards: Vec<Option<f64>>) {
        self.columns.push((label.into(), rewards));
    }

    /// Collects every `*.txt` log in `dir`, labelled by file stem and sorted
    /// by label.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let entries = fs::read_dir(dir).map_err(|source| FeedbackError::Read {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut logs = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(LOG_EXTENSION) {
                continue;
            }
            let Some(label) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            logs.push((label.to_string(), path.clone()));
        }
        logs.sort();

        let mut table = Self::new();
        for (label, path) in logs {
            table.push(label, read_rewards(&path)?);
        }
        Ok(table)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Length of the longest run; shorter runs are padded with empty cells.
    #[must_use]
    pub fn episodes(&self) -> usize {
        self.columns.iter().map(|(_, r)| r.len()).max().unwrap_or(0)
    }

    #[must_use]
    pub fn summaries(&self) -> Vec<(&str, RunSummary)> {
        self.columns
            .iter()
            .map(|(label, rewards)| (label.as_str(), RunSummary::from_rewards(rewards)))
            .collect()
    }

    /// CSV with an `Episode` index column starting at 0.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut out = String::from("Episode");
        for (label, _) in &self.columns {
            out.push(',');
            out.push_str(label);
        }
        out.push('\n');

        for episode in 0..self.episodes() {
            let _ = write!(out, "{episode}");
            for (_, rewards) in &self.columns {
                out.push(',');
                if let Some(Some(value)) = rewards.get(episode) {
                    // pandas float notation: 1.0, not 1
                    let _ = write!(out, "{value:?}");
                }
            }
            out.push('\n');
        }
        out
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_csv())?;
        Ok(())
    }
}
