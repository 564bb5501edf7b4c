//! Disk-backed cache for the index and skill bodies.
//!
//! Two namespaces under the cache root: a single `index.json` (TTL
//! configured by the caller, default 24h) and `bodies/<id>.<hash>.txt`
//! (per-skill, default TTL 7d). Reads are best-effort: any failure —
//! missing file, corrupt JSON, expired TTL — is reported as `Missing`/
//! `Stale` rather than propagated as an error. Writes are atomic
//! (temp file + rename) so a reader never observes a torn file, and
//! multiple router processes racing on the same cache root is tolerated
//! (last writer wins).

use crate::model::Index;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current state of a cache entry relative to its configured TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
    Missing,
}

#[derive(Serialize, Deserialize)]
struct CachedIndex {
    fetched_at: u64,
    index: Index,
}

pub struct CacheStore {
    root: PathBuf,
    index_ttl: Duration,
    body_ttl: Duration,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Write `bytes` to `path` atomically: create a temp file alongside the
/// destination, write and flush it, then rename over the target. Rename is
/// atomic on the same filesystem, so concurrent writers never leave a torn
/// file for a reader to observe.
fn atomic_write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl CacheStore {
    pub fn new(root: PathBuf, index_ttl: Duration, body_ttl: Duration) -> Self {
        CacheStore {
            root,
            index_ttl,
            body_ttl,
        }
    }

    fn index_path(&self) -> PathBuf {
        self.root.join("index.json")
    }

    fn body_path(&self, id: &str, hash: &str) -> PathBuf {
        self.root.join("bodies").join(format!("{id}.{hash}.txt"))
    }

    /// Load the cached index, reporting its freshness. Returns `(None,
    /// Missing)` on any read/parse failure, never an error — cache reads
    /// are best-effort.
    pub fn get_index(&self) -> (Option<Index>, Freshness) {
        let path = self.index_path();
        let data = match fs::read(&path) {
            Ok(d) => d,
            Err(_) => return (None, Freshness::Missing),
        };
        let cached: CachedIndex = match serde_json::from_slice(&data) {
            Ok(c) => c,
            Err(_) => {
                tracing::debug!(path = %path.display(), "index cache corrupt, ignoring");
                return (None, Freshness::Missing);
            }
        };

        let age = now_secs().saturating_sub(cached.fetched_at);
        if age > self.index_ttl.as_secs() {
            (Some(cached.index), Freshness::Stale)
        } else {
            (Some(cached.index), Freshness::Fresh)
        }
    }

    /// Persist a freshly-fetched index. Best-effort: logs a warning and
    /// returns without error on failure, mirroring how the teacher's
    /// activation logger tolerates unwritable disks.
    pub fn put_index(&self, index: &Index) {
        let cached = CachedIndex {
            fetched_at: now_secs(),
            index: index.clone(),
        };
        match serde_json::to_vec(&cached) {
            Ok(bytes) => {
                if let Err(e) = atomic_write(&self.index_path(), &bytes) {
                    tracing::warn!(error = %e, "failed to write index cache");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize index cache"),
        }
    }

    /// Load a cached body for `id`, verifying it against `expected_hash`.
    /// A hash mismatch or unreadable file reports `Missing` so the caller
    /// falls through to the remote/stale tiers.
    pub fn get_body(&self, id: &str, expected_hash: &str) -> (Option<Vec<u8>>, Freshness) {
        let path = self.body_path(id, expected_hash);
        let meta = match fs::metadata(&path) {
            Ok(m) => m,
            Err(_) => return (None, Freshness::Missing),
        };

        // Bodies are capped at a few KB (truncated to body_max_chars before
        // injection anyway), so a plain read is simpler than mapping the
        // file -- integrity is checked on every read, not just on write,
        // since the file may have been tampered with or truncated.
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(_) => return (None, Freshness::Missing),
        };

        let actual_hash = hex::encode(Sha256::digest(&bytes));
        if actual_hash != expected_hash {
            tracing::debug!(id, "cached body hash mismatch, discarding");
            return (None, Freshness::Missing);
        }

        let age = now_secs().saturating_sub(
            meta.modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs())
                .unwrap_or(0),
        );
        if age > self.body_ttl.as_secs() {
            (Some(bytes), Freshness::Stale)
        } else {
            (Some(bytes), Freshness::Fresh)
        }
    }

    /// Persist a freshly-fetched body. Best-effort, same as `put_index`.
    pub fn put_body(&self, id: &str, hash: &str, bytes: &[u8]) {
        if let Err(e) = atomic_write(&self.body_path(id, hash), bytes) {
            tracing::warn!(error = %e, id, "failed to write body cache");
        }
    }
}
