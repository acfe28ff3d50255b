//! FileProbe whose stat starts failing after a set number of calls.
//!
//! Stands in for a filesystem that returns something other than NotFound
//! (permission denied, I/O error on a failing disk) so the error paths of the
//! reconcile probe and the wait loop can be driven.

use bolt_monitor::error::AgentError;
use bolt_monitor::file::{FileFuture, FileProbe};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct FailingFiles {
    /// exists() calls that still report "absent" before failing
    absent_before_failure: AtomicUsize,
    exists_calls: AtomicUsize,
    writes: AtomicUsize,
}

impl FailingFiles {
    /// Fail every exists() call.
    pub fn new() -> Self {
        Self::failing_after(0)
    }

    /// Report `Ok(false)` for the first `n` exists() calls, then fail.
    pub fn failing_after(n: usize) -> Self {
        Self {
            absent_before_failure: AtomicUsize::new(n),
            exists_calls: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    /// write_atomic() calls, all of which fail.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Default for FailingFiles {
    fn default() -> Self {
        Self::new()
    }
}

fn denied(op: &str, path: &Path) -> AgentError {
    AgentError::io(
        op,
        path,
        io::Error::new(io::ErrorKind::PermissionDenied, "simulated: permission denied"),
    )
}

impl FileProbe for FailingFiles {
    fn exists(&self, path: &Path) -> FileFuture<'_, bool> {
        let path = path.to_path_buf();
        Box::pin(async move {
            self.exists_calls.fetch_add(1, Ordering::SeqCst);
            let still_absent = self
                .absent_before_failure
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if still_absent {
                Ok(false)
            } else {
                Err(denied("stat", &path))
            }
        })
    }

    fn read(&self, path: &Path) -> FileFuture<'_, Vec<u8>> {
        let path = path.to_path_buf();
        Box::pin(async move { Err(denied("read", &path)) })
    }

    fn write_atomic(&self, path: &Path, _data: Vec<u8>) -> FileFuture<'_, ()> {
        let path = path.to_path_buf();
        Box::pin(async move {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(denied("create", &path))
        })
    }
}
