//! Staging files and atomic promotion into the cache.
//!
//! A fetched asset is written to a hidden, randomly named sibling of its final path
//! and only linked under the final name once complete. Readers of the final
//! name therefore see either nothing or a whole file.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Result of promoting a staging file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    /// The staging file is now the cache entry.
    Committed,
    /// Another request committed first; ours was discarded.
    LostRace,
}

impl Promotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Promotion::Committed => "committed",
            Promotion::LostRace => "lost_race",
        }
    }
}

/// In-progress download next to its final cache path.
#[derive(Debug)]
pub struct StagingFile {
    path: PathBuf,
    final_path: PathBuf,
    file: File,
}

impl StagingFile {
    /// Create parent directories and open a fresh staging file for `final_path`.
    pub async fn create(final_path: &Path) -> io::Result<Self> {
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let path = staging_path_for(final_path);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            final_path: final_path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes).await
    }

    /// Flush and move the staging file under its final name.
    ///
    /// The staging file is gone afterwards, whatever the outcome.
    pub async fn commit(self) -> io::Result<Promotion> {
        let StagingFile {
            path,
            final_path,
            mut file,
        } = self;

        let flushed = async {
            file.flush().await?;
            file.sync_all().await
        }
        .await;
        drop(file);

        let outcome = match flushed {
            Ok(()) => promote(&path, &final_path).await,
            Err(e) => Err(e),
        };
        remove_quietly(&path).await;
        outcome
    }

    /// Drop the staging file without promoting it.
    pub async fn discard(self) {
        let StagingFile { path, file, .. } = self;
        drop(file);
        remove_quietly(&path).await;
    }
}

/// Link `staging` as `final_path` without ever replacing an existing entry.
async fn promote(staging: &Path, final_path: &Path) -> io::Result<Promotion> {
    match fs::hard_link(staging, final_path).await {
        Ok(()) => Ok(Promotion::Committed),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(Promotion::LostRace),
        Err(e) => {
            // Filesystems without hard links: rename, unless someone beat us to it.
            tracing::debug!(error = %e, "Hard link failed, falling back to rename");
            if fs::try_exists(final_path).await? {
                return Ok(Promotion::LostRace);
            }
            fs::rename(staging, final_path).await?;
            Ok(Promotion::Committed)
        }
    }
}

async fn remove_quietly(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove staging file"),
    }
}

/// Whether `name` is a staging file name (`.<file>.<suffix>.part`).
pub fn is_staging_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(".part")
}

fn staging_path_for(final_path: &Path) -> PathBuf {
    let suffix: String = std::iter::repeat_with(fastrand::alphanumeric).take(8).collect();
    let mut name = std::ffi::OsString::from(".");
    name.push(final_path.file_name().unwrap_or_default());
    name.push(format!(".{suffix}.part"));
    final_path.with_file_name(name)
}
