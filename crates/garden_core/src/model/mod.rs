//! Garden domain model.
//!
//! # Responsibility
//! - Define the persisted shapes for plants and care events.
//! - Own write-side validation that does not depend on storage.
//!
//! # Invariants
//! - Every record is identified by a stable UUID assigned on creation.
//! - A care event always belongs to exactly one plant.
//! - Derived dates are never stored; see [`crate::lifecycle`].

pub mod care;
pub mod plant;
