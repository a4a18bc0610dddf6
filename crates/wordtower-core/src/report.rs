//! Floor and session results with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::QuizMode;
use crate::model::WordRef;

/// Running score of a floor: correct answers out of questions answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorScore {
    pub correct: usize,
    pub asked: usize,
}

impl FloorScore {
    /// Fraction correct, 0.0 when nothing was asked.
    pub fn ratio(&self) -> f64 {
        if self.asked == 0 {
            0.0
        } else {
            self.correct as f64 / self.asked as f64
        }
    }
}

/// Outcome of one completed floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorResult {
    pub tier: u8,
    #[serde(default)]
    pub mode: QuizMode,
    pub correct: usize,
    pub total: usize,
    /// `correct / total`; no partial credit, no time component.
    pub score: f64,
    /// Points earned on the floor.
    #[serde(default)]
    pub points: u32,
    /// Words answered wrongly on this floor, in question order.
    pub missed: Vec<WordRef>,
    pub completed_at: DateTime<Utc>,
}

/// Summary of a whole quiz session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub floors: Vec<FloorResult>,
}

impl SessionSummary {
    pub fn total_correct(&self) -> usize {
        self.floors.iter().map(|f| f.correct).sum()
    }

    pub fn total_questions(&self) -> usize {
        self.floors.iter().map(|f| f.total).sum()
    }

    /// Accuracy across all floors.
    pub fn accuracy(&self) -> f64 {
        FloorScore {
            correct: self.total_correct(),
            asked: self.total_questions(),
        }
        .ratio()
    }

    /// Highest tier completed, if any.
    pub fn highest_floor(&self) -> Option<u8> {
        self.floors.iter().map(|f| f.tier).max()
    }

    pub fn total_points(&self) -> u32 {
        self.floors.iter().map(|f| f.points).sum()
    }

    /// Save the summary as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize summary")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        Ok(())
    }

    /// Load a summary from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read summary from {}", path.display()))?;
        let summary: SessionSummary =
            serde_json::from_str(&content).context("failed to parse summary JSON")?;
        Ok(summary)
    }

    /// Render a short plain-text summary.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for floor in &self.floors {
            out.push_str(&format!(
                "Floor {}: {}/{} ({:.0}%)\n",
                floor.tier,
                floor.correct,
                floor.total,
                floor.score * 100.0
            ));
        }
        out.push_str(&format!(
            "Total: {}/{} ({:.0}%), {} points",
            self.total_correct(),
            self.total_questions(),
            self.accuracy() * 100.0,
            self.total_points()
        ));
        out
    }
}
