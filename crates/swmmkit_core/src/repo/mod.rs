//! Feature store adapters.
//!
//! # Responsibility
//! - Expose the three SWMM layers as typed collections with list / get /
//!   insert / commit semantics.
//! - Keep SQL and geometry encoding inside the persistence boundary.
//!
//! # Invariants
//! - A repository handle only exists for a layer whose table is present.
//! - `commit_features` applies all changes in one transaction or none.

pub mod feature_repo;
pub mod project_repo;
