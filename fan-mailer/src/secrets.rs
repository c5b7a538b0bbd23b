use crate::error::MailerError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// JSON-backed store for delivery account credentials.
///
/// Keys are opaque to the engine: it only reads and writes the
/// `email`/`password`-shaped entries it is given. A missing file loads as
/// an empty map so first runs need no setup step.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<BTreeMap<String, String>, MailerError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let text = fs::read_to_string(&self.path)?;
        serde_json::from_str(&text).map_err(|e| MailerError::Store(e.to_string()))
    }

    pub fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), MailerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(entries)
            .map_err(|e| MailerError::Store(e.to_string()))?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}
