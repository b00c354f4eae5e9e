use std::{io, path::PathBuf};

use log::info;
use serde::{Serialize, de::DeserializeOwned};
use tokio::fs;

use crate::model::{ScoreDocument, UserDocument};

const USERS_FILE: &str = "users.json";
const SCORES_FILE: &str = "scores.json";

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum StoreError {
    #[display("failed to access {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("malformed document {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// JSON documents in a data directory.
///
/// Every write replaces the whole document through a temporary file and a
/// rename, so a crash never leaves a half-written document behind. Callers
/// serialize read-modify-write cycles themselves.
#[derive(Debug)]
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    /// Opens `dir`, creating it and any missing document.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self { dir: dir.into() };
        fs::create_dir_all(&store.dir)
            .await
            .map_err(|source| StoreError::Io {
                path: store.dir.clone(),
                source,
            })?;
        if !store.exists(USERS_FILE).await? {
            store.write(USERS_FILE, &UserDocument::default()).await?;
            info!("created {}", store.path(USERS_FILE).display());
        }
        if !store.exists(SCORES_FILE).await? {
            store.write(SCORES_FILE, &ScoreDocument::default()).await?;
            info!("created {}", store.path(SCORES_FILE).display());
        }
        Ok(store)
    }

    pub async fn users(&self) -> Result<UserDocument, StoreError> {
        self.read(USERS_FILE).await
    }

    pub async fn save_users(&self, users: &UserDocument) -> Result<(), StoreError> {
        self.write(USERS_FILE, users).await
    }

    pub async fn scores(&self) -> Result<ScoreDocument, StoreError> {
        self.read(SCORES_FILE).await
    }

    pub async fn save_scores(&self, scores: &ScoreDocument) -> Result<(), StoreError> {
        self.write(SCORES_FILE, scores).await
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        let path = self.path(name);
        fs::try_exists(&path)
            .await
            .map_err(|source| StoreError::Io { path, source })
    }

    async fn read<T>(&self, name: &str) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let path = self.path(name);
        let bytes = fs::read(&path).await.map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse { path, source })
    }

    async fn write<T>(&self, name: &str, document: &T) -> Result<(), StoreError>
    where
        T: Serialize,
    {
        let path = self.path(name);
        let bytes = serde_json::to_vec_pretty(document).map_err(|source| StoreError::Parse {
            path: path.clone(),
            source,
        })?;
        let temp = self.path(&format!("{name}.tmp"));
        fs::write(&temp, bytes)
            .await
            .map_err(|source| StoreError::Io {
                path: temp.clone(),
                source,
            })?;
        fs::rename(&temp, &path)
            .await
            .map_err(|source| StoreError::Io { path, source })
    }
}
