//! In-memory storage provider
//!
//! Zero-durability backend for tests and ephemeral deployments. Carries a
//! fail-injection switch so degraded-storage behavior can be exercised
//! without a real backend outage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::error::{AttuneError, Result};
use crate::memory::MemoryEntry;
use crate::storage::Storage;
use crate::tone::ToneProfile;

/// Volatile storage, with an optional injected failure mode
#[derive(Debug, Default)]
pub struct InMemoryStore {
    profiles: RwLock<HashMap<String, ToneProfile>>,
    entries: RwLock<HashMap<String, Vec<MemoryEntry>>>,
    failing: AtomicBool,
}

impl InMemoryStore {
    /// An empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle injected failure: while set, every operation returns
    /// `StorageUnavailable`
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AttuneError::StorageUnavailable(
                "injected backend failure".into(),
            ));
        }
        Ok(())
    }
}

impl Storage for InMemoryStore {
    fn load_profile(&self, user_id: &str) -> Result<Option<ToneProfile>> {
        self.check_available()?;
        let profiles = self
            .profiles
            .read()
            .map_err(|_| AttuneError::StorageUnavailable("profile map poisoned".into()))?;
        Ok(profiles.get(user_id).cloned())
    }

    fn save_profile(&self, profile: &ToneProfile) -> Result<()> {
        self.check_available()?;
        let mut profiles = self
            .profiles
            .write()
            .map_err(|_| AttuneError::StorageUnavailable("profile map poisoned".into()))?;
        profiles.insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    fn delete_profile(&self, user_id: &str) -> Result<bool> {
        self.check_available()?;
        let mut profiles = self
            .profiles
            .write()
            .map_err(|_| AttuneError::StorageUnavailable("profile map poisoned".into()))?;
        Ok(profiles.remove(user_id).is_some())
    }

    fn load_entries(&self, user_id: &str) -> Result<Vec<MemoryEntry>> {
        self.check_available()?;
        let entries = self
            .entries
            .read()
            .map_err(|_| AttuneError::StorageUnavailable("entry map poisoned".into()))?;
        Ok(entries.get(user_id).cloned().unwrap_or_default())
    }

    fn save_entries(&self, user_id: &str, new_entries: &[MemoryEntry]) -> Result<()> {
        self.check_available()?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AttuneError::StorageUnavailable("entry map poisoned".into()))?;
        entries.insert(user_id.to_string(), new_entries.to_vec());
        Ok(())
    }

    fn delete_entries(&self, user_id: &str) -> Result<bool> {
        self.check_available()?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AttuneError::StorageUnavailable("entry map poisoned".into()))?;
        Ok(entries.remove(user_id).is_some())
    }
}
