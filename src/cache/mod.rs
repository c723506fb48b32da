pub mod keys;
pub mod store;

#[cfg(test)]
pub mod tests;

pub use keys::CacheKey;
pub use store::{CacheEntry, CacheStats, CacheStore};
