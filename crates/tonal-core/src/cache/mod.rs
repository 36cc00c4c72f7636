//! On-disk cache for slowly changing API data.
//!
//! Entries are JSON files carrying their own TTL. Expired or unreadable
//! entries are treated as a miss, so a damaged cache never fails a request.

pub mod manager;

pub use manager::{CacheManager, CachedData};
