//! SWMM 5.2 export.
//!
//! # Responsibility
//! - Extract layer features into plain transport records.
//! - Render records into `.inp` text and write it to disk.
//!
//! # Invariants
//! - Rendering is a pure function of its records; no geometry or topology
//!   logic runs at export time.
//! - Incomplete attributes never abort an export.

pub mod inp;
pub mod records;
