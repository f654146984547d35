//! # Memory subsystem
//!
//! Two-tier per-user memory:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │           Memory Manager (keyed)            │
//! │  - per-user slots, coarse per-user lock     │
//! │  - lazy load, write-through persistence     │
//! └─────────────────────────────────────────────┘
//!          │                       │
//!    ┌─────┴──────┐         ┌──────┴───────┐
//!    │ Short-Term │         │  Long-Term   │
//!    │   Buffer   │         │    Store     │
//!    │ (10, FIFO) │         │ (50 KB, decay│
//!    │            │         │   eviction)  │
//!    └────────────┘         └──────────────┘
//! ```
//!
//! The short-term buffer is a non-durable recency cache that never fails.
//! The long-term store enforces a per-user byte budget synchronously at
//! write time, evicting by decayed retention weight. Decay is a live
//! recomputation at read/eviction time, never a background sweep.

pub mod decay;
pub mod long_term;
pub mod manager;
pub mod short_term;

pub use decay::DecayCurve;
pub use long_term::{EntryDraft, MemoryAnalytics, MemoryEntry, UserMemory};
pub use manager::{MemoryManager, MemorySnapshot, MemoryTier, UserSlot};
pub use short_term::SessionBuffer;
