//! Audit sinks for quality responses.
//!
//! The service hands every response to an optional sink after it has been
//! computed. Sinks are fire-and-forget from the caller's point of view: a
//! failing sink is logged and never turns a quality run into a failure.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::service::QualityResponse;
use crate::{DataQcError, Result};

/// Destination for quality responses.
pub trait ResultSink: Send + Sync {
    /// Stores one response.
    ///
    /// # Errors
    /// Returns `DataQcError::Persistence` or `DataQcError::Io` when the
    /// response cannot be stored.
    fn persist(&self, response: &QualityResponse) -> Result<()>;
}

/// Keeps responses in memory, for tests and in-process audit trails.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<QualityResponse>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every stored response, oldest first.
    pub fn entries(&self) -> Vec<QualityResponse> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of stored responses.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True when nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultSink for MemorySink {
    fn persist(&self, response: &QualityResponse) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(response.clone());
        Ok(())
    }
}

/// Appends each response as one JSON document per line.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    // Serializes appends from concurrent runs
    write_lock: Mutex<()>,
}

impl JsonLinesSink {
    /// Creates a sink that appends to `path`, creating it on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for JsonLinesSink {
    fn persist(&self, response: &QualityResponse) -> Result<()> {
        let mut line = serde_json::to_string(response)
            .map_err(|e| DataQcError::serialization("Failed to serialize audit entry", e))?;
        line.push('\n');

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                DataQcError::persistence_failed(
                    format!("Failed to open audit log {}", self.path.display()),
                    e,
                )
            })?;
        file.write_all(line.as_bytes()).map_err(|e| DataQcError::Io {
            context: format!("Failed to append to audit log {}", self.path.display()),
            source: e,
        })?;

        Ok(())
    }
}
