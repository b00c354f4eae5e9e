use std::{net::SocketAddr, path::PathBuf};

use chrono::TimeDelta;
use clap::Parser;

/// Account, score and ranking backend.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(long, env = "BLOCKFALL_ADDR", default_value = "127.0.0.1:3000")]
    pub addr: SocketAddr,
    /// Directory holding `users.json` and `scores.json`
    #[arg(long, env = "BLOCKFALL_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,
    /// Path prefix for every route, e.g. `/games/blockfall`
    #[arg(long, env = "BLOCKFALL_BASE_PATH", default_value = "")]
    base_path: String,
    /// Lifetime of issued session tokens
    #[arg(
        long,
        env = "BLOCKFALL_TOKEN_TTL_DAYS",
        default_value_t = 7,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    token_ttl_days: u16,
}

impl ServerArgs {
    /// The route prefix with a leading slash and no trailing slash, or an
    /// empty string when routes are served from the root.
    #[must_use]
    pub fn base_path(&self) -> String {
        normalize_base_path(&self.base_path)
    }

    #[must_use]
    pub fn token_ttl(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.token_ttl_days))
    }
}

fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
