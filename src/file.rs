// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Local file access.
//!
//! [`FileProbe`] is the filesystem half of the reconcile decision: existence,
//! whole-file reads, and atomic replacement. [`LocalFile`] is the `tokio::fs`
//! implementation; tests may swap in their own.

use crate::error::{AgentError, Result};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Boxed future returned by [`FileProbe`] methods.
pub type FileFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Owner read/write only.
pub const DEFAULT_FILE_MODE: u32 = 0o600;

/// Filesystem operations used by the reconcile engine and the sync loop.
pub trait FileProbe: Send + Sync + 'static {
    /// `Ok(false)` when the file does not exist; any other stat failure is an error.
    fn exists(&self, path: &Path) -> FileFuture<'_, bool>;

    /// Read the whole file.
    fn read(&self, path: &Path) -> FileFuture<'_, Vec<u8>>;

    /// Replace the file content so readers see either the old or the new bytes.
    fn write_atomic(&self, path: &Path, data: Vec<u8>) -> FileFuture<'_, ()>;
}

/// `tokio::fs` backed [`FileProbe`].
#[derive(Debug, Clone)]
pub struct LocalFile {
    mode: u32,
}

impl Default for LocalFile {
    fn default() -> Self {
        Self {
            mode: DEFAULT_FILE_MODE,
        }
    }
}

impl LocalFile {
    /// Create a probe that writes files with mode `0600`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the permission bits applied on write (unix only).
    pub fn with_mode(mode: u32) -> Self {
        Self { mode }
    }
}

/// Sibling temp file used while writing `path`.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "db".to_string());
    path.with_file_name(format!(".{}.bolt-monitor.tmp", name))
}

impl FileProbe for LocalFile {
    fn exists(&self, path: &Path) -> FileFuture<'_, bool> {
        let path = path.to_path_buf();
        Box::pin(async move {
            match tokio::fs::metadata(&path).await {
                Ok(_) => Ok(true),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(AgentError::io("stat", &path, e)),
            }
        })
    }

    fn read(&self, path: &Path) -> FileFuture<'_, Vec<u8>> {
        let path = path.to_path_buf();
        Box::pin(async move {
            tokio::fs::read(&path)
                .await
                .map_err(|e| AgentError::io("read", &path, e))
        })
    }

    fn write_atomic(&self, path: &Path, data: Vec<u8>) -> FileFuture<'_, ()> {
        let path = path.to_path_buf();
        let mode = self.mode;
        Box::pin(async move {
            let tmp = temp_path(&path);
            let result = write_then_rename(&tmp, &path, &data, mode).await;
            if result.is_err() {
                let _ = tokio::fs::remove_file(&tmp).await;
            }
            result
        })
    }
}

async fn write_then_rename(tmp: &Path, path: &Path, data: &[u8], mode: u32) -> Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(mode);
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = options
        .open(tmp)
        .await
        .map_err(|e| AgentError::io("create", tmp, e))?;
    file.write_all(data)
        .await
        .map_err(|e| AgentError::io("write", tmp, e))?;
    file.sync_all()
        .await
        .map_err(|e| AgentError::io("fsync", tmp, e))?;
    drop(file);

    // A leftover temp file from a crashed run keeps its old mode; reset it.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(tmp, std::fs::Permissions::from_mode(mode))
            .await
            .map_err(|e| AgentError::io("chmod", tmp, e))?;
    }

    tokio::fs::rename(tmp, path)
        .await
        .map_err(|e| AgentError::io("rename", path, e))?;

    debug!(path = %path.display(), bytes = data.len(), "File written");
    Ok(())
}
