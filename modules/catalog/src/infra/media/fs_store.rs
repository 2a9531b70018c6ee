//! Filesystem adapter of the media store port.
//!
//! Local deployments serve movie files straight from disk: promoting a file
//! is a rename from the temp directory into the media directory. Object
//! storage deployments replace this adapter; the port contract is identical.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::MediaStore;

pub struct FsMediaStore {
    temp_dir: PathBuf,
    media_dir: PathBuf,
}

impl FsMediaStore {
    pub fn new(temp_dir: impl Into<PathBuf>, media_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            media_dir: media_dir.into(),
        }
    }
}

fn ensure_bare_file_name(name: &str) -> anyhow::Result<()> {
    let path = Path::new(name);
    if path.components().count() != 1 || name.contains("..") {
        bail!("not a bare file name: {name}");
    }
    Ok(())
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn promote(&self, file_name: &str) -> anyhow::Result<()> {
        ensure_bare_file_name(file_name)?;
        let from = self.temp_dir.join(file_name);
        let to = self.media_dir.join(file_name);

        tokio::fs::create_dir_all(&self.media_dir)
            .await
            .with_context(|| format!("create media dir {} failed", self.media_dir.display()))?;
        tokio::fs::rename(&from, &to)
            .await
            .with_context(|| format!("promote {} -> {} failed", from.display(), to.display()))?;

        debug!(file = %to.display(), "Promoted media file");
        Ok(())
    }

    fn permanent_path(&self, file_name: &str) -> String {
        self.media_dir.join(file_name).to_string_lossy().into_owned()
    }

    async fn sweep_temp(&self, older_than: Duration) -> anyhow::Result<usize> {
        let mut removed = 0;
        let mut entries = match tokio::fs::read_dir(&self.temp_dir).await {
            Ok(entries) => entries,
            // A missing temp dir means nothing to sweep.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("read temp dir {} failed", self.temp_dir.display())
                })
            }
        };

        while let Some(entry) = entries.next_entry().await.context("read temp entry failed")? {
            let metadata = entry.metadata().await.context("stat temp entry failed")?;
            if !metadata.is_file() {
                continue;
            }
            let stale = metadata
                .modified()
                .ok()
                .and_then(|mtime| mtime.elapsed().ok())
                .map(|age| age > older_than)
                // Unreadable mtimes count as stale, same as unparseable
                // upload names.
                .unwrap_or(true);
            if stale {
                tokio::fs::remove_file(entry.path())
                    .await
                    .with_context(|| format!("remove {} failed", entry.path().display()))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
