//! On-disk projection cache
//!
//! The cache file is a CSV with exactly two columns, `PC1` and `PC2`, one row
//! per record of the most recently projected selection. Under the
//! fingerprint policy the key digest lives in a sidecar file
//! (`<cache>.key`) so the cache file keeps its two-column schema.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use trackmap_common::atomic::replace_file;
use trackmap_common::config::CacheKeyPolicy;
use trackmap_common::{AudioFeature, Result};

use super::Projection;

/// How a projection request was served
#[derive(Debug, Clone, PartialEq)]
pub enum CacheOutcome {
    /// Stored projection returned verbatim
    Hit,
    /// No usable cache; recomputed
    Miss,
    /// Cache file existed but could not be read; recomputed
    ReadError(String),
}

impl CacheOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOutcome::Hit => "hit",
            CacheOutcome::Miss => "miss",
            CacheOutcome::ReadError(_) => "read_error",
        }
    }
}

/// Identity of one projection request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub rows: usize,
    /// Hex SHA-256 over the feature names, source row indices and the
    /// selection's feature values
    pub fingerprint: String,
}

impl CacheKey {
    /// `values` is the zero-filled feature matrix of `rows` (one row per
    /// selected record, one column per feature), so a regenerated dataset
    /// with the same shape does not match an older cache.
    pub fn new(rows: &[usize], features: &[AudioFeature], values: &Array2<f64>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"trackmap-projection-v2\n");
        for feature in features {
            hasher.update(feature.column_name().as_bytes());
            hasher.update(b",");
        }
        hasher.update(b"\n");
        for &row in rows {
            hasher.update((row as u64).to_le_bytes());
        }
        hasher.update((values.nrows() as u64).to_le_bytes());
        hasher.update((values.ncols() as u64).to_le_bytes());
        for v in values.iter() {
            hasher.update(v.to_bits().to_le_bytes());
        }

        let fingerprint = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();

        Self {
            rows: rows.len(),
            fingerprint,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheRow {
    #[serde(rename = "PC1")]
    pc1: f64,
    #[serde(rename = "PC2")]
    pc2: f64,
}

/// Result of consulting the cache
#[derive(Debug)]
pub(crate) enum Lookup {
    Hit(Projection),
    Miss,
    ReadError(String),
}

/// Projection cache at a fixed path
#[derive(Debug)]
pub struct ProjectionCache {
    path: PathBuf,
    policy: CacheKeyPolicy,
    lock: Mutex<()>,
}

impl ProjectionCache {
    pub fn new(path: impl Into<PathBuf>, policy: CacheKeyPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> CacheKeyPolicy {
        self.policy
    }

    /// Sidecar file holding the fingerprint of the cached selection
    pub fn key_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".key");
        PathBuf::from(name)
    }

    /// Serialise lookup-then-store sequences within this process
    pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
        // A panic while holding the lock leaves no in-memory state to repair
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn lookup(&self, key: &CacheKey) -> Lookup {
        if !self.path.exists() {
            return Lookup::Miss;
        }

        if self.policy == CacheKeyPolicy::Fingerprint {
            match std::fs::read_to_string(self.key_path()) {
                Ok(stored) if stored.trim() == key.fingerprint => {}
                Ok(_) => {
                    debug!("Projection cache fingerprint differs");
                    return Lookup::Miss;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => return Lookup::Miss,
                Err(e) => return Lookup::ReadError(format!("key file: {}", e)),
            }
        }

        let projection = match read_cache_file(&self.path) {
            Ok(projection) => projection,
            Err(e) => return Lookup::ReadError(e.to_string()),
        };

        if projection.len() != key.rows {
            debug!(
                "Projection cache holds {} rows, selection has {}",
                projection.len(),
                key.rows
            );
            return Lookup::Miss;
        }

        Lookup::Hit(projection)
    }

    /// Overwrite the cache with `projection`
    ///
    /// The sidecar is removed before the cache file is replaced and written
    /// only afterwards, so an interrupted store never pairs a new key with
    /// old data.
    pub(crate) fn store(&self, key: &CacheKey, projection: &Projection) -> Result<()> {
        let key_path = self.key_path();
        match std::fs::remove_file(&key_path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        replace_file(&self.path, |out| {
            let mut wtr = csv::Writer::from_writer(out);
            for (&pc1, &pc2) in projection.pc1.iter().zip(projection.pc2.iter()) {
                wtr.serialize(CacheRow { pc1, pc2 })?;
            }
            if projection.is_empty() {
                wtr.write_record(["PC1", "PC2"])?;
            }
            wtr.flush()?;
            Ok(())
        })?;

        if self.policy == CacheKeyPolicy::Fingerprint {
            replace_file(&key_path, |out| {
                writeln!(out, "{}", key.fingerprint)?;
                Ok(())
            })?;
        }

        Ok(())
    }
}

fn read_cache_file(path: &Path) -> Result<Projection> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut projection = Projection::default();
    for row in rdr.deserialize::<CacheRow>() {
        let row = row?;
        projection.pc1.push(row.pc1);
        projection.pc2.push(row.pc2);
    }
    Ok(projection)
}
