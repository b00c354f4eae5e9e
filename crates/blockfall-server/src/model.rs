use blockfall_engine::GameMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ROLE: &str = "beginner";

/// Experience needed to leave `level`.
#[must_use]
pub fn exp_to_next_level(level: u32) -> u64 {
    u64::from(level) * 1000
}

/// A stored account. `password` holds `salt$sha256` in hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created: DateTime<Utc>,
    pub level: u32,
    pub exp: u64,
    pub role: String,
    #[serde(default)]
    pub achievements: Vec<String>,
    pub last_login: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn new(id: String, username: String, password: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username,
            password,
            created: now,
            level: 1,
            exp: 0,
            role: DEFAULT_ROLE.to_owned(),
            achievements: vec![],
            last_login: now,
        }
    }

    /// Adds experience and levels up at most once. Returns whether the level rose.
    pub fn gain_exp(&mut self, exp: u64) -> bool {
        self.exp += exp;
        let needed = exp_to_next_level(self.level);
        if self.exp < needed {
            return false;
        }
        self.level += 1;
        self.exp -= needed;
        true
    }

    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            username: self.username.clone(),
            created: self.created,
            level: self.level,
            exp: self.exp,
            role: self.role.clone(),
            achievements: self.achievements.clone(),
            last_login: self.last_login,
        }
    }
}

/// A [`User`] as returned to clients, without the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub created: DateTime<Utc>,
    pub level: u32,
    pub exp: u64,
    pub role: String,
    pub achievements: Vec<String>,
    pub last_login: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub score: u64,
    pub level: u32,
    #[serde(default)]
    pub lines: usize,
    pub game_mode: GameMode,
    pub date: DateTime<Utc>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(default)]
    pub users: Vec<User>,
}

impl UserDocument {
    #[must_use]
    pub fn by_name(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|user| user.username == username)
    }

    pub fn by_name_mut(&mut self, username: &str) -> Option<&mut User> {
        self.users.iter_mut().find(|user| user.username == username)
    }

    #[must_use]
    pub fn by_id(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn by_id_mut(&mut self, id: &str) -> Option<&mut User> {
        self.users.iter_mut().find(|user| user.id == id)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDocument {
    #[serde(default)]
    pub scores: Vec<ScoreRecord>,
}
