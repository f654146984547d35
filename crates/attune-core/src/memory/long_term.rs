//! Long-term store - size- and age-decayed per-user memory
//!
//! Entries are ranked and evicted by decayed retention weight rather than
//! insertion order: a fact reinforced many times stays alive even when it is
//! old, which a plain LRU cannot express without an explicit reinforcement
//! signal.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::decay::DecayCurve;
use crate::error::{AttuneError, Result};
use crate::types::{ContextLabel, Timestamp};

/// One durable memory record derived from one or more exchanges
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Unique identifier, individually addressable for reinforcement
    pub id: Uuid,

    /// Owning user
    pub user_id: String,

    /// When the entry was first recorded
    pub created_at: Timestamp,

    /// Last time the entry was reinforced; decay restarts from here
    pub last_reinforced_at: Timestamp,

    /// Context the underlying exchanges belonged to
    pub context: ContextLabel,

    /// Structured summary payload, built by an external summarizer
    pub payload: serde_json::Value,

    /// Exact serialized size of `payload`. The per-user byte budget is
    /// enforced against this, so it is measured, never estimated.
    pub size_bytes: usize,
}

impl MemoryEntry {
    /// Materialize a draft into an entry, measuring its serialized size
    pub fn from_draft(user_id: &str, draft: EntryDraft, now: Timestamp) -> Result<Self> {
        let size_bytes = serde_json::to_vec(&draft.payload)?.len();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            created_at: now,
            last_reinforced_at: now,
            context: draft.context,
            payload: draft.payload,
            size_bytes,
        })
    }

    /// Current retention weight under `curve`, evaluated at `now`.
    /// Derived, never persisted as stale truth.
    pub fn weight(&self, curve: &DecayCurve, now: Timestamp) -> f64 {
        curve.weight(self.last_reinforced_at, now)
    }
}

/// Payload handed to [`UserMemory::record`]. Summarization is an external
/// collaborator concern; the store only measures and keeps the result.
#[derive(Debug, Clone)]
pub struct EntryDraft {
    /// Context the summarized exchanges belonged to
    pub context: ContextLabel,

    /// Structured summary payload
    pub payload: serde_json::Value,
}

/// Read-only aggregate over one user's long-term memory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryAnalytics {
    /// Entry count per context label
    pub context_distribution: HashMap<ContextLabel, usize>,

    /// Mean decayed weight across entries (0.0 when empty)
    pub mean_weight: f64,

    /// Number of surviving entries
    pub entry_count: usize,

    /// Total payload bytes across surviving entries
    pub total_bytes: usize,
}

/// One user's long-term memory collection with budget-driven eviction
#[derive(Debug, Clone)]
pub struct UserMemory {
    entries: Vec<MemoryEntry>,
    budget_bytes: usize,
    curve: DecayCurve,
}

impl UserMemory {
    /// Create an empty collection under the given byte budget and decay curve
    pub fn new(budget_bytes: usize, curve: DecayCurve) -> Self {
        Self {
            entries: Vec::new(),
            budget_bytes,
            curve,
        }
    }

    /// Rebuild a collection from previously persisted entries.
    /// Runs eviction so a shrunk budget is enforced immediately.
    pub fn from_entries(
        entries: Vec<MemoryEntry>,
        budget_bytes: usize,
        curve: DecayCurve,
        now: Timestamp,
    ) -> Self {
        let mut memory = Self {
            entries,
            budget_bytes,
            curve,
        };
        memory.evict_to_budget(now);
        memory
    }

    /// Record a new entry, then evict down to the byte budget.
    ///
    /// Fails with `EntryTooLarge` when the serialized payload alone exceeds
    /// the whole budget; in that case nothing is stored.
    pub fn record(
        &mut self,
        user_id: &str,
        draft: EntryDraft,
        now: Timestamp,
    ) -> Result<MemoryEntry> {
        let entry = MemoryEntry::from_draft(user_id, draft, now)?;
        if entry.size_bytes > self.budget_bytes {
            return Err(AttuneError::EntryTooLarge {
                size: entry.size_bytes,
                budget: self.budget_bytes,
            });
        }
        self.entries.push(entry.clone());
        self.evict_to_budget(now);
        Ok(entry)
    }

    /// Restart decay for an entry that was retrieved and judged relevant
    /// again. No-op if the entry was already evicted.
    pub fn reinforce(&mut self, entry_id: Uuid, now: Timestamp) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == entry_id) {
            entry.last_reinforced_at = now;
        }
    }

    /// Replace the payload of an existing entry, re-measuring its size and
    /// re-running eviction. No-op if the entry no longer exists.
    pub fn amend_payload(
        &mut self,
        entry_id: Uuid,
        payload: serde_json::Value,
        now: Timestamp,
    ) -> Result<()> {
        let size_bytes = serde_json::to_vec(&payload)?.len();
        if size_bytes > self.budget_bytes {
            return Err(AttuneError::EntryTooLarge {
                size: size_bytes,
                budget: self.budget_bytes,
            });
        }
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == entry_id) {
            entry.payload = payload;
            entry.size_bytes = size_bytes;
            self.evict_to_budget(now);
        }
        Ok(())
    }

    /// Entries ranked by decayed weight descending, ties broken by most
    /// recently reinforced, truncated to `limit`. Pure read: retrieval does
    /// NOT reinforce.
    pub fn retrieve(
        &self,
        context: Option<ContextLabel>,
        now: Timestamp,
        limit: usize,
    ) -> Vec<MemoryEntry> {
        let mut ranked: Vec<&MemoryEntry> = self
            .entries
            .iter()
            .filter(|e| context.map_or(true, |c| e.context == c))
            .collect();

        ranked.sort_by(|a, b| {
            let (wa, wb) = (a.weight(&self.curve, now), b.weight(&self.curve, now));
            wb.partial_cmp(&wa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.last_reinforced_at.cmp(&a.last_reinforced_at))
        });

        ranked.into_iter().take(limit).cloned().collect()
    }

    /// Remove lowest-weight entries until the total payload size fits the
    /// budget. Ties lose by oldest `last_reinforced_at`. Terminates in at
    /// most `entry_count` iterations because each removal strictly shrinks
    /// the total. Returns the evicted entries.
    pub fn evict_to_budget(&mut self, now: Timestamp) -> Vec<MemoryEntry> {
        let mut evicted = Vec::new();

        while self.total_bytes() > self.budget_bytes {
            let Some(victim_idx) = self
                .entries
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    let (wa, wb) = (a.weight(&self.curve, now), b.weight(&self.curve, now));
                    wa.partial_cmp(&wb)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(a.last_reinforced_at.cmp(&b.last_reinforced_at))
                })
                .map(|(i, _)| i)
            else {
                break;
            };

            let victim = self.entries.swap_remove(victim_idx);
            tracing::debug!(
                user_id = %victim.user_id,
                entry_id = %victim.id,
                size_bytes = victim.size_bytes,
                "evicted long-term entry over byte budget"
            );
            evicted.push(victim);
        }

        evicted
    }

    /// Aggregate statistics, recomputed on demand to avoid staleness after
    /// eviction
    pub fn analytics(&self, now: Timestamp) -> MemoryAnalytics {
        let mut context_distribution: HashMap<ContextLabel, usize> = HashMap::new();
        let mut weight_sum = 0.0;

        for entry in &self.entries {
            *context_distribution.entry(entry.context).or_insert(0) += 1;
            weight_sum += entry.weight(&self.curve, now);
        }

        let entry_count = self.entries.len();
        MemoryAnalytics {
            context_distribution,
            mean_weight: if entry_count == 0 {
                0.0
            } else {
                weight_sum / entry_count as f64
            },
            entry_count,
            total_bytes: self.total_bytes(),
        }
    }

    /// Total payload bytes across entries
    pub fn total_bytes(&self) -> usize {
        self.entries.iter().map(|e| e.size_bytes).sum()
    }

    /// Number of surviving entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, unranked, for persistence
    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
