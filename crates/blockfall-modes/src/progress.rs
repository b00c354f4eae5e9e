use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{PUZZLES, Puzzle, STAGES, Stage, find_puzzle, find_stage};

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ProgressError {
    #[display("puzzle '{id}' does not exist")]
    UnknownPuzzle { id: String },
    #[display("puzzle '{id}' is still locked")]
    PuzzleLocked { id: String },
    #[display("stage {stage} does not exist")]
    UnknownStage { stage: u32 },
    #[display("stage {stage} is still locked")]
    StageLocked { stage: u32 },
}

/// Unlocked puzzles and the current selection.
///
/// Puzzles unlock in order: solving puzzle `n` unlocks puzzle `n + 1`.
///
/// # Example
///
/// ```
/// use blockfall_modes::PuzzleProgress;
///
/// let mut progress = PuzzleProgress::default();
/// assert!(progress.select("pzl_2").is_err());
///
/// progress.record_solved("pzl_1");
/// progress.select("pzl_2").unwrap();
/// assert_eq!(progress.current().name, "L and J");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PuzzleProgress {
    unlocked_puzzles: usize,
    current_puzzle: String,
}

impl Default for PuzzleProgress {
    fn default() -> Self {
        Self {
            unlocked_puzzles: 1,
            current_puzzle: PUZZLES[0].id.to_owned(),
        }
    }
}

impl PuzzleProgress {
    #[must_use]
    pub fn unlocked_puzzles(&self) -> usize {
        self.unlocked_puzzles
    }

    #[must_use]
    pub fn is_unlocked(&self, id: &str) -> bool {
        find_puzzle(id).is_some_and(|(index, _)| index < self.unlocked_puzzles)
    }

    /// The selected puzzle, or the first one when the selection is unknown.
    #[must_use]
    pub fn current(&self) -> &'static Puzzle {
        find_puzzle(&self.current_puzzle).map_or(&PUZZLES[0], |(_, puzzle)| puzzle)
    }

    pub fn select(&mut self, id: &str) -> Result<(), ProgressError> {
        let Some((index, puzzle)) = find_puzzle(id) else {
            return Err(ProgressError::UnknownPuzzle { id: id.to_owned() });
        };
        if index >= self.unlocked_puzzles {
            warn!("puzzle {id} is locked");
            return Err(ProgressError::PuzzleLocked { id: id.to_owned() });
        }
        puzzle.id.clone_into(&mut self.current_puzzle);
        Ok(())
    }

    /// Unlocks the puzzle after `id`. Returns whether a new puzzle was unlocked.
    pub fn record_solved(&mut self, id: &str) -> bool {
        let Some((index, _)) = find_puzzle(id) else {
            return false;
        };
        let next = index + 1;
        if next >= self.unlocked_puzzles && next < PUZZLES.len() {
            self.unlocked_puzzles = next + 1;
            info!("unlocked puzzle {}", PUZZLES[next].id);
            return true;
        }
        false
    }

    /// Selects the puzzle after the current one if it is unlocked.
    pub fn advance(&mut self) -> Option<&'static Puzzle> {
        let (index, _) = find_puzzle(&self.current_puzzle)?;
        let next = PUZZLES.get(index + 1)?;
        self.select(next.id).ok()?;
        Some(next)
    }

    /// Repairs values read from an old or edited progress file: the unlocked
    /// count is clamped to the known puzzles and a locked or unknown
    /// selection falls back to the first puzzle.
    #[must_use]
    pub fn normalized(self) -> Self {
        let unlocked_puzzles = self.unlocked_puzzles.clamp(1, PUZZLES.len());
        let current_puzzle = match find_puzzle(&self.current_puzzle) {
            Some((index, _)) if index < unlocked_puzzles => self.current_puzzle,
            _ => PUZZLES[0].id.to_owned(),
        };
        Self {
            unlocked_puzzles,
            current_puzzle,
        }
    }
}

/// Unlocked adventure stages and the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdventureProgress {
    unlocked_stages: u32,
    current_stage: u32,
}

impl Default for AdventureProgress {
    fn default() -> Self {
        Self {
            unlocked_stages: 1,
            current_stage: 1,
        }
    }
}

impl AdventureProgress {
    #[must_use]
    pub fn unlocked_stages(&self) -> u32 {
        self.unlocked_stages
    }

    #[must_use]
    pub fn current(&self) -> &'static Stage {
        find_stage(self.current_stage).unwrap_or(&STAGES[0])
    }

    pub fn select(&mut self, stage: u32) -> Result<(), ProgressError> {
        if find_stage(stage).is_none() {
            return Err(ProgressError::UnknownStage { stage });
        }
        if stage > self.unlocked_stages {
            warn!("stage {stage} is locked");
            return Err(ProgressError::StageLocked { stage });
        }
        self.current_stage = stage;
        Ok(())
    }

    /// Unlocks the stage after `stage`, up to the last defined stage.
    /// Returns whether a new stage was unlocked.
    pub fn record_cleared(&mut self, stage: u32) -> bool {
        let next = stage.saturating_add(1);
        if stage >= self.unlocked_stages && find_stage(next).is_some() {
            self.unlocked_stages = next;
            info!("unlocked stage {next}");
            return true;
        }
        false
    }

    /// Selects the next stage if it is unlocked.
    pub fn advance(&mut self) -> Option<&'static Stage> {
        let next = self.current_stage.checked_add(1)?;
        self.select(next).ok()?;
        Some(self.current())
    }

    #[must_use]
    pub fn normalized(self) -> Self {
        let last = u32::try_from(STAGES.len()).unwrap_or(u32::MAX);
        let unlocked_stages = self.unlocked_stages.clamp(1, last);
        let current_stage = if (1..=unlocked_stages).contains(&self.current_stage) {
            self.current_stage
        } else {
            1
        };
        Self {
            unlocked_stages,
            current_stage,
        }
    }
}
