//! Durable local buffer for the location stream.
//!
//! Append-only CSV file, one line per sample, fields in fixed order
//! `UserId,Latitude,Longitude,FixTimestamp,DeviceTimestamp`. The file is the
//! write-side offline safety net for location samples; recovery and replay
//! tooling live outside this crate, and nothing here ever reads, rewrites,
//! or deletes a line.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use guardiantrack_protocol::LocationSample;

/// Append-only sample log, safe at line granularity against process crash.
#[derive(Debug, Clone)]
pub struct SampleLog {
    path: PathBuf,
}

impl SampleLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one sample as a single newline-terminated line.
    ///
    /// The line is formatted up front and written with one `write_all`, so a
    /// crash mid-append corrupts at most the final line; prior lines remain
    /// intact. Creates the file (and its parent directory) on first use.
    pub fn append(&self, sample: &LocationSample) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let line = format!(
            "{},{},{},{},{}\n",
            sample.identity_id,
            sample.latitude,
            sample.longitude,
            sample.fix_timestamp_ms,
            sample.capture_timestamp_ms
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()
    }
}
