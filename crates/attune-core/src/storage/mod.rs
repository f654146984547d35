//! Persistence seam
//!
//! The engine talks to storage only through the [`Storage`] trait, so the
//! backing store can be swapped without touching memory or tone logic.
//! Two providers ship in-tree: [`SqliteStore`] for durable single-node
//! persistence and [`InMemoryStore`] for tests and ephemeral use.
//!
//! Providers persist whole per-user states. Partial-write consistency is
//! the provider's problem; callers always hand over the full profile or
//! the full entry set for a user.

mod in_memory;
mod sqlite;

pub use in_memory::InMemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::memory::MemoryEntry;
use crate::tone::ToneProfile;

/// Contract every storage provider implements.
///
/// All methods are infallible-on-absence where that makes sense: loading a
/// missing user yields `Ok(None)` or an empty vec, and deletes report
/// whether anything existed. Providers signal backend trouble with
/// [`crate::AttuneError::StorageUnavailable`].
pub trait Storage: Send + Sync {
    /// Load a user's tone profile, `None` if never saved
    fn load_profile(&self, user_id: &str) -> Result<Option<ToneProfile>>;

    /// Persist a profile, replacing any previous version
    fn save_profile(&self, profile: &ToneProfile) -> Result<()>;

    /// Remove a profile; returns whether one existed
    fn delete_profile(&self, user_id: &str) -> Result<bool>;

    /// Load all long-term entries for a user, empty if none
    fn load_entries(&self, user_id: &str) -> Result<Vec<MemoryEntry>>;

    /// Replace a user's long-term entries with the given set
    fn save_entries(&self, user_id: &str, entries: &[MemoryEntry]) -> Result<()>;

    /// Remove all entries for a user; returns whether any existed
    fn delete_entries(&self, user_id: &str) -> Result<bool>;
}
