//! Durable cache store backed by one JSON file per key.
//!
//! Files are named after the SHA-256 of the key, so arbitrary keys map to
//! safe file names. Writes go to a temporary sibling which is synced and
//! then renamed over the target, so a reader sees either the old entry or
//! the new one, never a torn write. A process that dies mid-write leaves
//! at most a temporary file behind, which `purge_expired` cleans up.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use mtaa_core::{MtaaError, Result};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::entry::{CacheEntry, CacheStats};
use crate::store::CacheStore;

const ENTRY_EXT: &str = "json";
const TEMP_EXT: &str = "tmp";

/// Temporary files older than this are treated as leftovers from a crash.
const ORPHAN_TEMP_AGE: Duration = Duration::from_secs(60);

/// On-disk implementation of CacheStore.
pub struct DiskCacheStore {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
}

/// What a file in the cache directory turned out to be.
enum Scanned {
    Entry(PathBuf, CacheEntry),
    Corrupted(PathBuf),
    OrphanTemp(PathBuf),
}

fn cache_err(context: &str, err: impl std::fmt::Display) -> MtaaError {
    MtaaError::Cache {
        message: format!("{}: {}", context, err),
    }
}

impl DiskCacheStore {
    /// Open (and create if needed) a cache directory on the system clock.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_clock(dir, Arc::new(SystemClock)).await
    }

    /// Open a cache directory with a custom clock.
    pub async fn open_with_clock(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| cache_err("failed to create cache directory", e))?;

        info!("Opened disk cache at {}", dir.display());
        Ok(Self { dir, clock })
    }

    /// The cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_stem(key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", Self::file_stem(key), ENTRY_EXT))
    }

    /// Read and decode the file for `key`. Any failure is a miss.
    async fn read_entry(&self, key: &str) -> Option<CacheEntry> {
        let path = self.path_for(key);

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Error reading cache file for key {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) if entry.key == key => Some(entry),
            Ok(entry) => {
                warn!("Cache file for key {} holds key {}, ignoring", key, entry.key);
                None
            }
            Err(e) => {
                warn!("Corrupted cache entry for key {}: {}", key, e);
                None
            }
        }
    }

    async fn write_entry(&self, entry: &CacheEntry) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| cache_err("failed to create cache directory", e))?;

        let bytes = serde_json::to_vec(entry)?;
        let target = self.path_for(&entry.key);
        let temp = self.dir.join(format!(
            ".{}.{}.{}",
            Self::file_stem(&entry.key),
            Uuid::new_v4().simple(),
            TEMP_EXT
        ));

        let written = async {
            let mut file = fs::File::create(&temp).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&temp, &target).await
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&temp).await;
            return Err(cache_err("failed to write cache entry", e));
        }
        Ok(())
    }

    /// Classify every file in the cache directory.
    async fn scan(&self) -> Result<Vec<Scanned>> {
        let mut scanned = Vec::new();

        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(scanned),
            Err(e) => return Err(cache_err("failed to list cache directory", e)),
        };

        while let Some(file) = dir
            .next_entry()
            .await
            .map_err(|e| cache_err("failed to list cache directory", e))?
        {
            let path = file.path();
            match path.extension().and_then(|ext| ext.to_str()) {
                Some(ENTRY_EXT) => {
                    let parsed = fs::read(&path)
                        .await
                        .ok()
                        .and_then(|bytes| serde_json::from_slice::<CacheEntry>(&bytes).ok());
                    match parsed {
                        Some(entry) => scanned.push(Scanned::Entry(path, entry)),
                        None => scanned.push(Scanned::Corrupted(path)),
                    }
                }
                Some(TEMP_EXT) => {
                    let age = file
                        .metadata()
                        .await
                        .ok()
                        .and_then(|meta| meta.modified().ok())
                        .and_then(|modified| SystemTime::now().duration_since(modified).ok());
                    if age.map_or(false, |age| age > ORPHAN_TEMP_AGE) {
                        scanned.push(Scanned::OrphanTemp(path));
                    }
                }
                _ => {}
            }
        }

        Ok(scanned)
    }

    async fn remove(path: &Path) -> bool {
        match fs::remove_file(path).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!("Failed to remove cache file {}: {}", path.display(), e);
                false
            }
        }
    }
}

#[async_trait]
impl CacheStore for DiskCacheStore {
    async fn get(&self, key: &str) -> Option<CacheEntry> {
        let Some(entry) = self.read_entry(key).await else {
            debug!("Cache miss for key: {}", key);
            return None;
        };

        if entry.is_valid_at(self.clock.now()) {
            debug!("Cache hit for key: {}", key);
            Some(entry)
        } else {
            debug!("Cache expired for key: {}", key);
            None
        }
    }

    async fn peek(&self, key: &str) -> Option<CacheEntry> {
        self.read_entry(key).await
    }

    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) -> Result<CacheEntry> {
        let entry = CacheEntry::new(key, value, self.clock.now(), ttl);
        self.write_entry(&entry).await?;

        debug!("Cached data with key: {}, TTL: {:?}", key, ttl);
        Ok(entry)
    }

    async fn invalidate(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Invalidated cache for key: {}", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(cache_err("failed to invalidate cache entry", e)),
        }
    }

    async fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut removed = 0;

        for scanned in self.scan().await? {
            let path = match scanned {
                Scanned::Entry(path, entry) if !entry.is_valid_at(now) => path,
                Scanned::Entry(..) => continue,
                Scanned::Corrupted(path) | Scanned::OrphanTemp(path) => path,
            };
            if Self::remove(&path).await {
                removed += 1;
            }
        }

        info!("Cleaned up {} expired cache entries", removed);
        Ok(removed)
    }

    async fn clear(&self) -> Result<()> {
        for scanned in self.scan().await? {
            let path = match scanned {
                Scanned::Entry(path, _) | Scanned::Corrupted(path) | Scanned::OrphanTemp(path) => path,
            };
            Self::remove(&path).await;
        }

        info!("Cleared all cache entries");
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats> {
        let mut entries = Vec::new();
        let mut corrupted = 0;

        for scanned in self.scan().await? {
            match scanned {
                Scanned::Entry(_, entry) => entries.push(entry),
                Scanned::Corrupted(_) => corrupted += 1,
                Scanned::OrphanTemp(_) => {}
            }
        }

        Ok(CacheStats::collect(&entries, corrupted, self.clock.now()))
    }
}
