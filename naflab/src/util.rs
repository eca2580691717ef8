//! Helpers shared by the experiments.
use anyhow::Result;
use log::info;
use naflab_core::RewardHistory;
use serde::Serialize;
use std::{fs, path::Path};

/// Summary of the returns of evaluation episodes.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EvalRow {
    /// Name of the matchup or the setting evaluated.
    pub title: String,

    /// The number of episodes.
    pub n_episodes: usize,

    /// Mean return.
    pub mean: f32,

    /// Minimum return.
    pub min: f32,

    /// Maximum return.
    pub max: f32,
}

impl EvalRow {
    /// Summarizes `returns`. Statistics of an empty slice are NaN.
    pub fn new(title: impl Into<String>, returns: &[f32]) -> Self {
        let n = returns.len();
        let (mean, min, max) = match n {
            0 => (f32::NAN, f32::NAN, f32::NAN),
            _ => (
                returns.iter().sum::<f32>() / n as f32,
                returns.iter().copied().fold(f32::INFINITY, f32::min),
                returns.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            ),
        };

        Self {
            title: title.into(),
            n_episodes: n,
            mean,
            min,
            max,
        }
    }
}

/// Collects evaluation summaries, logging each of them.
#[derive(Debug, Default)]
pub struct EvalReport {
    rows: Vec<EvalRow>,
}

impl EvalReport {
    /// Constructs an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the returns of a matchup and returns its summary.
    pub fn add(&mut self, title: impl Into<String>, returns: &[f32]) -> &EvalRow {
        let row = EvalRow::new(title, returns);
        info!(
            "{}: mean={:.4} min={:.4} max={:.4} ({} episodes)",
            row.title, row.mean, row.min, row.max, row.n_episodes
        );
        self.rows.push(row);
        &self.rows[self.rows.len() - 1]
    }

    /// Returns the summaries in the order they were added.
    pub fn rows(&self) -> &[EvalRow] {
        &self.rows
    }

    /// Saves the summaries as a CSV file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        for row in self.rows.iter() {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Saves a reward history as `{dir}/{name}.csv`, creating `dir` if needed.
pub fn save_history(history: &RewardHistory, dir: impl AsRef<Path>, name: &str) -> Result<()> {
    fs::create_dir_all(&dir)?;
    let path = dir.as_ref().join(format!("{}.csv", name));
    history.save(&path)?;
    info!("Saved rewards of {} episodes into {:?}", history.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_eval_row() {
        let row = EvalRow::new("u vs v", &[1.0, -1.0, 3.0]);
        assert_eq!(row.n_episodes, 3);
        assert_eq!(row.mean, 1.0);
        assert_eq!(row.min, -1.0);
        assert_eq!(row.max, 3.0);
        assert!(EvalRow::new("none", &[]).mean.is_nan());
    }

    #[test]
    fn test_save_report_and_history() -> Result<()> {
        let dir = TempDir::new("naflab_util")?;
        let mut report = EvalReport::new();
        report.add("optimal v", &[0.5, 0.5]);
        report.add("constant 0", &[0.0]);
        let path = dir.path().join("eval.csv");
        report.save(&path)?;
        let text = fs::read_to_string(&path)?;
        assert!(text.starts_with("title,n_episodes,mean,min,max"));
        assert_eq!(text.lines().count(), 3);

        let mut history = RewardHistory::new(2);
        history.push(1.0);
        save_history(&history, dir.path().join("run"), "rewards")?;
        assert!(dir.path().join("run").join("rewards.csv").exists());
        Ok(())
    }
}
