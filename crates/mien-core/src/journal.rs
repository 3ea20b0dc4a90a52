//! Append-only emotion journal backed by a single JSON array file.
//!
//! Writes go through an atomic replace (serialize to a sibling `.tmp`
//! file, then rename over the destination), so a reader never observes
//! a partially written journal. Reads are forgiving: a missing or
//! corrupt file loads as empty.

use crate::record::EmotionRecord;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("could not encode journal: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not replace {}: {source}", path.display())]
    Replace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Where the records of a [`EmotionJournal::load_detailed`] call came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Journal file was present and parsed as a JSON array.
    File,
    /// No journal exists at the path yet (first run).
    Missing,
    /// A file exists but is unreadable or not a JSON array.
    Corrupt,
}

/// Load result with provenance, for callers that want to tell a fresh
/// journal apart from a damaged one. [`EmotionJournal::load`] collapses
/// all three cases to a plain (possibly empty) vector.
#[derive(Debug)]
pub struct Loaded {
    pub records: Vec<EmotionRecord>,
    pub source: LoadSource,
    /// Entries inside a valid array that did not deserialize into a record.
    pub skipped: usize,
}

/// Handle to the journal file. Construction performs no IO.
///
/// Clones share one append lock, so concurrent `append` calls through
/// clones of the same handle serialize their read-modify-write cycles.
/// Two handles created independently (or two processes) still race.
#[derive(Clone)]
pub struct EmotionJournal {
    path: PathBuf,
    append_lock: Arc<Mutex<()>>,
}

impl EmotionJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all records. Missing, unreadable, or non-array content loads
    /// as an empty vector; this is recovery, not an error.
    pub fn load(&self) -> Vec<EmotionRecord> {
        self.load_detailed().records
    }

    /// Read all records, reporting where they came from and how many
    /// malformed entries were skipped.
    pub fn load_detailed(&self) -> Loaded {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no journal yet");
                return Loaded {
                    records: Vec::new(),
                    source: LoadSource::Missing,
                    skipped: 0,
                };
            }
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "journal unreadable, loading as empty"
                );
                return Loaded {
                    records: Vec::new(),
                    source: LoadSource::Corrupt,
                    skipped: 0,
                };
            }
        };

        let value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "journal is not valid JSON, loading as empty"
                );
                return Loaded {
                    records: Vec::new(),
                    source: LoadSource::Corrupt,
                    skipped: 0,
                };
            }
        };

        let Some(items) = value.as_array() else {
            tracing::warn!(
                path = %self.path.display(),
                "journal root is not an array, loading as empty"
            );
            return Loaded {
                records: Vec::new(),
                source: LoadSource::Corrupt,
                skipped: 0,
            };
        };

        let mut records = Vec::with_capacity(items.len());
        let mut skipped = 0usize;
        for item in items {
            match serde_json::from_value::<EmotionRecord>(item.clone()) {
                Ok(record) => records.push(record),
                Err(err) => {
                    skipped += 1;
                    tracing::debug!(error = %err, "skipping malformed journal entry");
                }
            }
        }
        if skipped > 0 {
            tracing::warn!(
                path = %self.path.display(),
                skipped,
                "journal contained malformed entries"
            );
        }

        Loaded {
            records,
            source: LoadSource::File,
            skipped,
        }
    }

    /// Append one observation stamped with the current local time.
    ///
    /// Loads the existing sequence, pushes, and persists via atomic
    /// replace. Returns the stored record as confirmation. Write
    /// failures propagate; callers must see durability loss.
    pub fn append(
        &self,
        name: &str,
        emotion: &str,
        percentage: f64,
    ) -> Result<EmotionRecord, JournalError> {
        let _guard = self
            .append_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut records = self.load();
        let record = EmotionRecord::now(name, emotion, percentage);
        records.push(record.clone());
        self.write_atomic(&records)?;

        tracing::debug!(
            path = %self.path.display(),
            emotion = %record.emotion,
            total = records.len(),
            "appended journal entry"
        );
        Ok(record)
    }

    /// Persist the full sequence via atomic replace.
    ///
    /// A crash mid-write or between write and rename leaves the prior
    /// file intact; the destination path never holds a partial array.
    pub fn save(&self, records: &[EmotionRecord]) -> Result<(), JournalError> {
        let _guard = self
            .append_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.write_atomic(records)
    }

    fn write_atomic(&self, records: &[EmotionRecord]) -> Result<(), JournalError> {
        let json = serde_json::to_string_pretty(records)?;

        // The temp file must be a sibling of the destination: rename is
        // only atomic within one filesystem.
        let tmp = temp_path(&self.path);
        fs::write(&tmp, json).map_err(|source| JournalError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| JournalError::Replace {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("journal"));
    name.push(".tmp");
    path.with_file_name(name)
}
