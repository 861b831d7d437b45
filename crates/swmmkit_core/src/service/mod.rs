//! Core use-case services.
//!
//! # Responsibility
//! - Run the topology and derivation batches against explicit layer handles.
//! - Keep CLI callers decoupled from storage and geometry details.
//!
//! # Invariants
//! - Services hold no state between calls; every call re-reads its layers.
//! - Each store-level operation is one read / mutate / commit unit of work.

pub mod derive;
pub mod ids;
pub mod project;
pub mod topology;
pub mod validate;
