use std::collections::HashMap;

use blockfall_engine::GameMode;
use chrono::{DateTime, Datelike as _, Utc};
use serde::Serialize;

use crate::model::ScoreRecord;

/// Maximum number of entries in a ranking.
pub const RANKING_SIZE: usize = 100;

/// The special event ranking covers May 2025 (UTC).
const SPECIAL_EVENT: (i32, u32) = (2025, 5);

/// Time window of a ranking. Dates are compared in UTC and weeks are ISO
/// weeks starting on Monday.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum RankingPeriod {
    #[display("daily")]
    Daily,
    #[display("weekly")]
    Weekly,
    #[display("monthly")]
    Monthly,
    #[display("yearly")]
    Yearly,
    #[display("special")]
    Special,
    #[default]
    #[display("all")]
    All,
}

impl RankingPeriod {
    /// Parses a period name; anything unrecognized means [`Self::All`].
    #[must_use]
    pub fn parse_or_all(name: &str) -> Self {
        match name {
            "daily" => Self::Daily,
            "weekly" => Self::Weekly,
            "monthly" => Self::Monthly,
            "yearly" => Self::Yearly,
            "special" => Self::Special,
            _ => Self::All,
        }
    }

    #[must_use]
    pub fn contains(self, date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            Self::Daily => date.date_naive() == now.date_naive(),
            Self::Weekly => date.iso_week() == now.iso_week(),
            Self::Monthly => (date.year(), date.month()) == (now.year(), now.month()),
            Self::Yearly => date.year() == now.year(),
            Self::Special => (date.year(), date.month()) == SPECIAL_EVENT,
            Self::All => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingEntry {
    pub rank: usize,
    #[serde(flatten)]
    pub record: ScoreRecord,
}

/// Ranks the best score of each user within `period`, highest first.
///
/// Ties keep the score that was submitted first ahead.
#[must_use]
pub fn rank(
    scores: &[ScoreRecord],
    period: RankingPeriod,
    game_mode: Option<GameMode>,
    now: DateTime<Utc>,
) -> Vec<RankingEntry> {
    let mut best: HashMap<&str, &ScoreRecord> = HashMap::new();
    let eligible = scores.iter().filter(|record| {
        game_mode.is_none_or(|mode| record.game_mode == mode) && period.contains(record.date, now)
    });
    for record in eligible {
        best.entry(record.user_id.as_str())
            .and_modify(|current| {
                if record.score > current.score {
                    *current = record;
                }
            })
            .or_insert(record);
    }

    let mut best = best.into_values().collect::<Vec<_>>();
    best.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.timestamp.cmp(&b.timestamp))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    best.into_iter()
        .take(RANKING_SIZE)
        .enumerate()
        .map(|(index, record)| RankingEntry {
            rank: index + 1,
            record: record.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn record(user: &str, score: u64, mode: GameMode, date: DateTime<Utc>) -> ScoreRecord {
        ScoreRecord {
            id: format!("{user}-{score}"),
            user_id: user.to_owned(),
            username: user.to_owned(),
            score,
            level: 1,
            lines: 0,
            game_mode: mode,
            date,
            timestamp: date.timestamp_millis(),
        }
    }

    #[test]
    fn test_parse_period() {
        assert_eq!(RankingPeriod::parse_or_all("weekly"), RankingPeriod::Weekly);
        assert_eq!(RankingPeriod::parse_or_all("special"), RankingPeriod::Special);
        assert_eq!(RankingPeriod::parse_or_all("hourly"), RankingPeriod::All);
        assert_eq!(RankingPeriod::Monthly.to_string(), "monthly");
    }

    #[test]
    fn test_period_windows() {
        let now = at(2025, 1, 2);
        assert!(RankingPeriod::Daily.contains(now, now));
        assert!(!RankingPeriod::Daily.contains(at(2025, 1, 1), now));

        // 2024-12-30 is Monday of ISO week 1 of 2025
        assert!(RankingPeriod::Weekly.contains(at(2024, 12, 30), now));
        assert!(!RankingPeriod::Weekly.contains(at(2024, 12, 29), now));
        assert!(!RankingPeriod::Monthly.contains(at(2024, 12, 30), now));
        assert!(!RankingPeriod::Yearly.contains(at(2024, 12, 30), now));
        assert!(RankingPeriod::Yearly.contains(at(2025, 11, 30), now));

        assert!(RankingPeriod::Special.contains(at(2025, 5, 1), now));
        assert!(RankingPeriod::Special.contains(at(2025, 5, 31), now));
        assert!(!RankingPeriod::Special.contains(at(2025, 6, 1), now));
        assert!(RankingPeriod::All.contains(at(1999, 1, 1), now));
    }

    #[test]
    fn test_best_score_per_user() {
        let now = at(2025, 3, 10);
        let scores = [
            record("alice", 500, GameMode::Classic, at(2025, 3, 1)),
            record("bob", 900, GameMode::Classic, at(2025, 3, 2)),
            record("alice", 1500, GameMode::Classic, at(2025, 3, 3)),
            record("carol", 2000, GameMode::Speed, at(2025, 3, 4)),
            record("bob", 700, GameMode::Classic, at(2025, 3, 5)),
        ];

        let all = rank(&scores, RankingPeriod::All, None, now);
        let order = all
            .iter()
            .map(|e| (e.rank, e.record.user_id.as_str(), e.record.score))
            .collect::<Vec<_>>();
        assert_eq!(
            order,
            [(1, "carol", 2000), (2, "alice", 1500), (3, "bob", 900)]
        );

        let classic = rank(&scores, RankingPeriod::All, Some(GameMode::Classic), now);
        assert_eq!(classic.len(), 2);
        assert_eq!(classic[0].record.user_id, "alice");

        let monthly = rank(&scores, RankingPeriod::Monthly, None, at(2025, 4, 1));
        assert!(monthly.is_empty());
    }

    #[test]
    fn test_ties_favor_earlier_scores() {
        let now = at(2025, 3, 10);
        let scores = [
            record("late", 1000, GameMode::Zen, at(2025, 3, 5)),
            record("early", 1000, GameMode::Zen, at(2025, 3, 1)),
            record("early", 1000, GameMode::Zen, at(2025, 3, 6)),
        ];
        let ranking = rank(&scores, RankingPeriod::All, None, now);
        assert_eq!(ranking[0].record.user_id, "early");
        assert_eq!(ranking[0].record.date, at(2025, 3, 1));
        assert_eq!(ranking[1].rank, 2);
    }

    #[test]
    fn test_ranking_is_capped() {
        let now = at(2025, 3, 10);
        let scores = (0..150_u64)
            .map(|i| record(&format!("user{i}"), i * 10, GameMode::Classic, now))
            .collect::<Vec<_>>();
        let ranking = rank(&scores, RankingPeriod::Daily, None, now);
        assert_eq!(ranking.len(), RANKING_SIZE);
        assert_eq!(ranking[0].record.score, 1490);
        assert_eq!(ranking[99].rank, 100);
    }

    #[test]
    fn test_entry_format() {
        let now = at(2025, 3, 10);
        let entry = RankingEntry {
            rank: 1,
            record: record("alice", 10, GameMode::Battle, now),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["rank"], 1);
        assert_eq!(json["userId"], "alice");
        assert_eq!(json["gameMode"], "battle");
    }
}
