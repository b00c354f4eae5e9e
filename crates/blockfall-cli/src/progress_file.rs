use std::{collections::BTreeMap, fs, io, path::Path};

use anyhow::Context as _;
use blockfall_modes::{AdventureProgress, PuzzleProgress};
use log::info;
use serde::{Deserialize, Serialize};

use crate::game::Completion;

/// Unlock state and personal bests kept between runs.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct ProgressFile {
    pub puzzle: PuzzleProgress,
    pub adventure: AdventureProgress,
    /// Best score per [`GameArgs::best_score_key`](crate::game::GameArgs::best_score_key).
    pub best_scores: BTreeMap<String, u64>,
}

impl ProgressFile {
    /// Reads the progress file, starting fresh if it does not exist yet.
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        let progress: Self = serde_json::from_str(&json)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(progress.normalized())
    }

    pub(crate) fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    #[must_use]
    pub(crate) fn normalized(self) -> Self {
        Self {
            puzzle: self.puzzle.normalized(),
            adventure: self.adventure.normalized(),
            best_scores: self.best_scores,
        }
    }

    /// Keeps `score` if it beats the best under `key`. Returns whether it did.
    pub(crate) fn record_score(&mut self, key: &str, score: u64) -> bool {
        let best = self.best_scores.get(key).copied().unwrap_or(0);
        if score <= best {
            return false;
        }
        info!("new best for {key}: {score} (was {best})");
        self.best_scores.insert(key.to_owned(), score);
        true
    }

    /// Unlocks what `completion` earns and moves the selection forward.
    /// Returns whether anything new was unlocked.
    pub(crate) fn record(&mut self, completion: Completion) -> bool {
        match completion {
            Completion::Puzzle(id) => {
                let unlocked = self.puzzle.record_solved(id);
                if let Some(next) = self.puzzle.advance() {
                    info!("next puzzle: {}", next.name);
                }
                unlocked
            }
            Completion::Stage(stage) => {
                let unlocked = self.adventure.record_cleared(stage);
                if let Some(next) = self.adventure.advance() {
                    info!("next stage: {}", next.title);
                }
                unlocked
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;

    #[test]
    fn test_missing_file_starts_fresh() {
        let path = env::temp_dir().join("blockfall-cli-missing/progress.json");
        assert_eq!(ProgressFile::load(&path).unwrap(), ProgressFile::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = env::temp_dir().join(format!("blockfall-cli-{}", rand::random::<u64>()));
        let path = dir.join("progress.json");

        let mut progress = ProgressFile::default();
        assert!(progress.record(Completion::Puzzle("pzl_1")));
        assert!(progress.record(Completion::Stage(1)));
        progress.save(&path).unwrap();

        let loaded = ProgressFile::load(&path).unwrap();
        assert_eq!(loaded, progress);
        assert_eq!(loaded.puzzle.current().id, "pzl_2");
        assert_eq!(loaded.adventure.current().number, 2);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_replaying_unlocks_nothing() {
        let mut progress = ProgressFile::default();
        assert!(progress.record(Completion::Stage(1)));
        progress.adventure.select(1).unwrap();
        assert!(!progress.record(Completion::Stage(1)));
        // the selection still moves on
        assert_eq!(progress.adventure.current().number, 2);
    }

    #[test]
    fn test_best_scores() {
        let mut progress = ProgressFile::default();
        assert!(!progress.record_score("speed/60s/easy", 0));
        assert!(progress.record_score("speed/60s/easy", 1200));
        assert!(!progress.record_score("speed/60s/easy", 1200));
        assert!(!progress.record_score("speed/60s/easy", 800));
        assert!(progress.record_score("speed/60s/hard", 800));
        assert!(progress.record_score("speed/60s/easy", 1500));
        assert_eq!(progress.best_scores["speed/60s/easy"], 1500);

        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["bestScores"]["speed/60s/hard"], 800);
        let loaded = serde_json::from_value::<ProgressFile>(json).unwrap().normalized();
        assert_eq!(loaded.best_scores, progress.best_scores);
    }

    #[test]
    fn test_file_format() {
        let progress: ProgressFile = serde_json::from_str(
            r#"{"puzzle": {"unlockedPuzzles": 2, "currentPuzzle": "pzl_2"}}"#,
        )
        .unwrap();
        let progress = progress.normalized();
        assert_eq!(progress.puzzle.current().id, "pzl_2");
        assert_eq!(progress.adventure.unlocked_stages(), 1);
        assert!(progress.best_scores.is_empty());
    }
}
