//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation, lifecycle derivation and repository calls into
//!   use-case level APIs.
//! - Keep CLI and scheduler callers decoupled from storage details.

pub mod care_service;
pub mod plant_service;
