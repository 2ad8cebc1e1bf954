//! Session cache persistence.
//!
//! Only the adapter, login method and claims are written; keys and id tokens
//! never leave memory.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{WalletError, WalletResult};
use crate::session::state::UserInfo;

/// A login that can be silently resumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSession {
    pub adapter: String,
    pub login_provider: String,
    pub verifier_id_field: Option<String>,
    /// Expiry timestamp (seconds since epoch).
    pub expires_at: u64,
    pub user_info: UserInfo,
}

impl CachedSession {
    pub fn new(
        adapter: impl Into<String>,
        login_provider: impl Into<String>,
        verifier_id_field: Option<String>,
        ttl: Duration,
        user_info: UserInfo,
    ) -> Self {
        Self {
            adapter: adapter.into(),
            login_provider: login_provider.into(),
            verifier_id_field,
            expires_at: now_secs().saturating_add(ttl.as_secs()),
            user_info,
        }
    }

    /// Check if the cached login is still valid.
    pub fn is_active(&self) -> bool {
        self.expires_at > now_secs()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// File-backed store for at most one cached session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: Option<PathBuf>,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A store that never persists anything.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    /// Store for `session.cache_path`; an empty path disables persistence.
    pub fn from_path_str(path: &str) -> Self {
        if path.trim().is_empty() {
            Self::disabled()
        } else {
            Self::new(path)
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load the cached session, if any. A corrupt cache is treated as empty.
    pub fn load(&self) -> WalletResult<Option<CachedSession>> {
        let path = match &self.path {
            Some(path) if path.exists() => path,
            _ => return Ok(None),
        };

        let file = File::open(path)
            .map_err(|e| WalletError::Sdk(format!("cannot open session cache: {}", e)))?;
        match serde_json::from_reader(BufReader::new(file)) {
            Ok(cached) => Ok(Some(cached)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable session cache");
                Ok(None)
            }
        }
    }

    pub fn save(&self, session: &CachedSession) -> WalletResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    WalletError::Sdk(format!("cannot create session cache directory: {}", e))
                })?;
            }
        }
        let file = File::create(path)
            .map_err(|e| WalletError::Sdk(format!("cannot write session cache: {}", e)))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, session)
            .map_err(|e| WalletError::Sdk(format!("cannot serialize session cache: {}", e)))?;
        writer
            .flush()
            .map_err(|e| WalletError::Sdk(format!("cannot write session cache: {}", e)))?;
        tracing::debug!(path = %path.display(), adapter = %session.adapter, "Session cached");
        Ok(())
    }

    pub fn clear(&self) -> WalletResult<()> {
        match &self.path {
            Some(path) if path.exists() => fs::remove_file(path)
                .map_err(|e| WalletError::Sdk(format!("cannot remove session cache: {}", e))),
            _ => Ok(()),
        }
    }
}
