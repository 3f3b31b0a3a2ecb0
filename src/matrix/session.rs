//! Persistence of the Matrix session in the data directory.
//!
//! The data directory holds:
//! - `session`: JSON file with the access token and the last sync token
//! - `sqlite`: the matrix-sdk state store
//!
//! Reusing the session on restart keeps the same device and avoids a new
//! login, the sync token avoids handling old messages twice.

use std::path::{Path, PathBuf};

use log::{debug, trace};
use matrix_sdk::authentication::matrix::MatrixSession as UserSession;
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSession {
    user_session: UserSession,

    #[serde(skip_serializing_if = "Option::is_none")]
    sync_token: Option<String>,
}

/// Session files of the bot.
#[derive(Clone)]
pub struct SessionStore {
    /// Session found on disk when the store was opened
    session: Option<PersistedSession>,
    sqlite_path: PathBuf,
    session_path: PathBuf,
}

impl SessionStore {
    /// Opens the session files of `data_dir`, creating the directory if needed.
    pub async fn open(data_dir: &Path) -> Result<Self, anyhow::Error> {
        fs::create_dir_all(data_dir).await?;

        let sqlite_path = data_dir.join("sqlite");
        let session_path = data_dir.join("session");
        debug!(
            "session at {}, store at {}",
            session_path.display(),
            sqlite_path.display()
        );

        let session = match fs::try_exists(&session_path).await? {
            true => Some(read_session(&session_path).await?),
            false => None,
        };
        debug!("found user session: {}", session.is_some());

        Ok(SessionStore {
            session,
            sqlite_path,
            session_path,
        })
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub fn user_session(&self) -> Option<&UserSession> {
        self.session.as_ref().map(|s| &s.user_session)
    }

    pub fn sync_token(&self) -> Option<String> {
        self.session.as_ref().and_then(|s| s.sync_token.clone())
    }

    /// Stores a fresh login, dropping any previous sync token.
    pub async fn persist_user_session(&self, user_session: &UserSession) -> anyhow::Result<()> {
        trace!("persist user session");
        write_session(
            &self.session_path,
            &PersistedSession {
                user_session: user_session.clone(),
                sync_token: None,
            },
        )
        .await
    }

    /// Updates the sync token of the stored session.
    pub async fn persist_sync_token(&self, sync_token: String) -> anyhow::Result<()> {
        trace!("persist sync token {}", sync_token);
        let mut session = read_session(&self.session_path).await?;
        session.sync_token = Some(sync_token);
        write_session(&self.session_path, &session).await
    }
}

async fn read_session(path: &Path) -> anyhow::Result<PersistedSession> {
    let data = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&data)?)
}

async fn write_session(path: &Path, session: &PersistedSession) -> anyhow::Result<()> {
    fs::write(path, serde_json::to_string(session)?).await?;
    Ok(())
}
