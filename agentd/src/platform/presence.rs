//! Foreground presence backed by an exclusive lock file.
//!
//! On this host the platform's "visible, therefore kept alive" contract maps
//! to an advisory exclusive lock: holding it marks the agent as the one live
//! instance, and a second daemon is denied the same way a host would deny a
//! duplicate ongoing indicator. Dropping the guard releases the lock; the
//! kernel also releases it if the process dies. The holder writes its pid
//! into the file so a `stop` invocation can signal the resident daemon.

use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use fs2::FileExt;
use guardiantrack_core::config;
use guardiantrack_core::{ForegroundGuard, ForegroundPresence, PresenceDenied};

pub const LOCK_FILENAME: &str = "agent.lock";

/// Lock-file presence provider.
#[derive(Debug, Clone)]
pub struct LockFilePresence {
    path: PathBuf,
}

impl LockFilePresence {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Pid of the live lock holder, or `None` when nothing holds the lock.
    ///
    /// Liveness is decided by the lock itself, not the file contents: when
    /// this probe can take the lock, the previous holder is gone and any
    /// recorded pid is stale.
    pub fn holder_pid(&self) -> std::io::Result<Option<u32>> {
        let file = match OpenOptions::new().read(true).write(true).open(&self.path) {
            Ok(file) => file,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error),
        };
        if file.try_lock_exclusive().is_ok() {
            if let Err(error) = FileExt::unlock(&file) {
                tracing::warn!("failed to release probe lock: {error}");
            }
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(raw.trim().parse().ok())
    }
}

impl Default for LockFilePresence {
    fn default() -> Self {
        Self::new(config::data_dir().join(LOCK_FILENAME))
    }
}

fn record_pid(mut file: &File) -> std::io::Result<()> {
    file.set_len(0)?;
    write!(file, "{}", std::process::id())?;
    file.flush()
}

struct LockGuard {
    file: File,
}

impl ForegroundGuard for LockGuard {}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(error) = self.file.unlock() {
            tracing::warn!("failed to release presence lock: {error}");
        }
    }
}

impl ForegroundPresence for LockFilePresence {
    fn establish(&self) -> Result<Box<dyn ForegroundGuard>, PresenceDenied> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|error| PresenceDenied {
                reason: format!("cannot create {}: {error}", parent.display()),
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|error| PresenceDenied {
                reason: format!("cannot open {}: {error}", self.path.display()),
            })?;

        file.try_lock_exclusive().map_err(|error| PresenceDenied {
            reason: format!("lock on {} is held elsewhere: {error}", self.path.display()),
        })?;

        if let Err(error) = record_pid(&file) {
            tracing::warn!("cannot record holder pid: {error}");
        }

        tracing::debug!(path = %self.path.display(), "foreground presence established");
        Ok(Box::new(LockGuard { file }))
    }
}
