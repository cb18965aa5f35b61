//! Signed-in session and its on-disk persistence.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fs, io, path::PathBuf};
use tracing::{debug, info};

/// Bearer credential issued by the backend's token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user_id: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty() && now < self.expires_at
    }
}

/// JSON file holding the last issued session between CLI runs.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the persisted session. A missing file or an expired session
    /// both read as "signed out".
    pub fn load(&self) -> Result<Option<Session>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };
        let session: Session = serde_json::from_str(&raw)
            .with_context(|| format!("parsing session file {}", self.path.display()))?;

        if !session.is_active(Utc::now()) {
            debug!(path = %self.path.display(), "persisted session has expired");
            return Ok(None);
        }
        Ok(Some(session))
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let raw = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, raw).with_context(|| format!("writing {}", self.path.display()))?;
        info!(path = %self.path.display(), user = %session.user_id, "session saved");
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing {}", self.path.display())),
        }
    }
}
