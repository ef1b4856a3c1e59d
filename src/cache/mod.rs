//! Cache Module
//!
//! Deadline-ordered entry storage with lifetime and idle expiry and a
//! serialized-size budget.

mod budget;
mod entry;
mod index;
mod stats;
mod table;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use budget::SizeBudget;
pub use entry::{CacheEntry, Deadline, Lifetime};
pub use index::{EvictionIndex, OrderKey};
pub use stats::CacheStats;
pub use table::CacheTable;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
