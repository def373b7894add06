use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::profile::models::Profile;

/// File-backed persistence for the single profile document.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored profile. `None` when nothing has been saved yet.
    pub async fn load(&self) -> Result<Option<Profile>, AppError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("reading {}", self.path.display()))
                    .into())
            }
        };
        let value: Value = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Profile::from_value(value).map(Some)
    }

    /// Replaces the stored profile. The file is written to a temporary
    /// sibling and renamed, so readers never see a partial document.
    pub async fn save(&self, profile: &Profile) -> Result<(), AppError> {
        let body = serde_json::to_vec_pretty(profile).context("serializing profile")?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &body))
            .await
            .context("profile writer task panicked")??;
        info!("Profile saved to {}", self.path.display());
        Ok(())
    }
}

fn write_atomic(path: &Path, body: &[u8]) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    tmp.write_all(body)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("profile.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_preserves_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("nested").join("profile.json"));
        let profile = Profile::from_value(json!({
            "personal": {"firstName": "Lucía"},
            "experience": [{"raw": "Acme", "relevanceTags": ["data"]}],
            "languages": ["es", "en"]
        }))
        .unwrap();

        store.save(&profile).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, profile);

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\n  \"personal\""));
        assert!(text.contains("Lucía"));
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        std::fs::write(&path, r#"{"experience": []}"#).unwrap();
        let err = ProfileStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
