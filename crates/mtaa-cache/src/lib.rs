//! # Mtaa Cache
//!
//! Key-value cache with per-entry expiry, backing every category fetch.

pub mod clock;
pub mod disk;
pub mod entry;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use disk::DiskCacheStore;
pub use entry::{CacheEntry, CacheStats, EntryInfo};
pub use store::{get_typed, peek_typed, set_typed, CacheStore, InMemoryCacheStore};
