// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod classify;
pub mod clock;
pub mod config;
pub mod fetch;
pub mod job;
pub mod relevance;
pub mod salary;
pub mod text;

// Boards, orchestration, persistence
pub mod harvest;
pub mod scheduler;
pub mod sources;
pub mod store;

pub mod metrics;

// ---- Re-exports for stable public API ----
pub use crate::harvest::{Harvester, RunSummary};
pub use crate::job::{JobDraft, JobRecord};
pub use crate::sources::{ItemOutcome, ScrapeReport, SourceAdapter, SourceKind};
pub use crate::store::{JsonFileStore, MemoryStore, StoreGateway};
