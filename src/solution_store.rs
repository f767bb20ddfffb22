//! Persistence of the best-known individual: a JSON blob of the gene
//! vector with its score and a timestamp, used to seed one slot of a
//! later run's population.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};
use crate::types::Gene;

/// A persisted gene vector with its score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedSolution {
    pub genes: Vec<Gene>,
    pub fitness: f64,
    pub timestamp: DateTime<Utc>,
}

impl SavedSolution {
    pub fn new(genes: Vec<Gene>, fitness: f64) -> Self {
        Self {
            genes,
            fitness,
            timestamp: Utc::now(),
        }
    }
}

/// Load a previously saved solution. A missing file is not an error, and
/// an unreadable one only costs the warm start.
pub fn load_solution(path: &Path) -> Option<SavedSolution> {
    if !path.exists() {
        return None;
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("could not read saved solution '{}': {e}", path.display());
            return None;
        }
    };
    match serde_json::from_str::<SavedSolution>(&content) {
        Ok(solution) => {
            info!(
                "loaded best-known solution with fitness {:.2}",
                solution.fitness
            );
            Some(solution)
        }
        Err(e) => {
            warn!("could not parse saved solution '{}': {e}", path.display());
            None
        }
    }
}

/// Write a solution, creating parent directories as needed
pub fn save_solution(path: &Path, solution: &SavedSolution) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(solution).map_err(|e| SchedulerError::JsonParse {
        file: path.display().to_string(),
        message: e.to_string(),
    })?;
    fs::write(path, json)?;
    info!("saved solution with fitness {:.2}", solution.fitness);
    Ok(())
}

/// Save only when the score matches or improves the stored one.
/// Returns whether the solution was written.
pub fn save_if_better(path: &Path, solution: &SavedSolution) -> Result<bool> {
    if let Some(previous) = load_solution(path) {
        if solution.fitness < previous.fitness {
            info!(
                "keeping previous solution ({:.2} > {:.2})",
                previous.fitness, solution.fitness
            );
            return Ok(false);
        }
    }
    save_solution(path, solution)?;
    Ok(true)
}
