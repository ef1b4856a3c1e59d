//! Persistence Hooks
//!
//! Pull-based loading from, and snapshot export to, external storage. The
//! storage format belongs to the caller; values cross this boundary as JSON
//! tokens.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::CacheEntry;
use crate::codec::JsonCodec;
use crate::error::{CacheError, Result};
use crate::facade::Cache;

// == Load Result ==
/// One step of a loader sequence.
///
/// A step missing its key or value is skipped. The sequence ends after a
/// step with `remaining == false`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadResult {
    pub key: Option<String>,
    /// JSON token of the value
    pub value: Option<String>,
    /// Whether the loader should be called again
    pub remaining: bool,
}

impl LoadResult {
    /// A complete key/value step.
    pub fn entry(key: impl Into<String>, value: impl Into<String>, remaining: bool) -> Self {
        Self {
            key: Some(key.into()),
            value: Some(value.into()),
            remaining,
        }
    }

    /// A step that failed to produce a pair.
    pub fn skip(remaining: bool) -> Self {
        Self {
            key: None,
            value: None,
            remaining,
        }
    }
}

// == Export Record ==
/// One entry handed to an export sink.
#[derive(Debug, Clone, Copy)]
pub struct ExportRecord<'a> {
    pub key: &'a str,
    /// JSON token of the value
    pub token: &'a str,
    pub value: &'a Value,
    /// Position in eviction order
    pub index: usize,
    /// Number of entries in the snapshot
    pub total: usize,
}

// == Cache Snapshot ==
/// Entries frozen at the time the snapshot was taken, in eviction order.
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    entries: Vec<(String, CacheEntry)>,
}

impl CacheSnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in eviction order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    // == Export ==
    /// Calls `sink` once per entry. Stops at the first sink error.
    ///
    /// Returns the number of entries exported.
    pub fn export_to<F>(&self, mut sink: F) -> Result<usize>
    where
        F: FnMut(ExportRecord<'_>) -> anyhow::Result<()>,
    {
        let total = self.entries.len();

        for (index, (key, entry)) in self.entries.iter().enumerate() {
            let token = JsonCodec::token(&entry.value)?;
            sink(ExportRecord {
                key,
                token: &token,
                value: &entry.value,
                index,
                total,
            })
            .map_err(|source| CacheError::Export { index, source })?;
        }

        info!(total, "Exported cache snapshot");
        Ok(total)
    }
}

impl Cache {
    // == Load ==
    /// Stores pairs pulled from `loader` with the default lifetime and idle
    /// window until it reports nothing remaining.
    ///
    /// Incomplete steps and unparsable tokens are skipped. A rejected store
    /// ends the load with that error; entries loaded before it are kept.
    /// Returns the number of entries stored.
    pub fn load_from<F>(&self, mut loader: F) -> Result<usize>
    where
        F: FnMut() -> LoadResult,
    {
        let mut loaded = 0;

        loop {
            let step = loader();

            match (step.key, step.value) {
                (Some(key), Some(token)) => match JsonCodec::parse(&token) {
                    Ok(encoded) => {
                        self.store_encoded(&key, encoded, None, None)?;
                        loaded += 1;
                    }
                    Err(err) => warn!(key = %key, error = %err, "Skipping unparsable cached value"),
                },
                _ => debug!("Loader step without a key/value pair, skipping"),
            }

            if !step.remaining {
                break;
            }
        }

        info!(loaded, "Loaded cache entries");
        Ok(loaded)
    }

    // == Snapshot ==
    /// Freezes the current entries. Later mutations do not affect it.
    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            entries: self.snapshot_entries(),
        }
    }

    /// Exports a snapshot of the current entries to `sink`.
    pub fn export_to<F>(&self, sink: F) -> Result<usize>
    where
        F: FnMut(ExportRecord<'_>) -> anyhow::Result<()>,
    {
        self.snapshot().export_to(sink)
    }
}
