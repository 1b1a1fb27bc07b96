//! Core domain logic for the garden care tracker.
//! This crate is the single source of truth for plant and care invariants.

pub mod alert;
pub mod clock;
pub mod db;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use alert::{AlertBatch, AlertJob, AlertKind, AlertRunner, AlertSink, CheckOutcome, LogSink};
pub use clock::{Clock, FixedClock, SystemClock};
pub use db::{open_db, open_db_in_memory, DbError};
pub use lifecycle::Lifecycle;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::care::{CareEvent, CareId, CareInput, CareKind, CareValidationError};
pub use model::plant::{Plant, PlantId, PlantInput, PlantValidationError};
pub use repo::care_repo::{CareRepository, SqliteCareRepository};
pub use repo::plant_repo::{PlantRepository, SqlitePlantRepository};
pub use repo::{RepoError, RepoResult};
pub use service::care_service::{CareRecord, CareService, CareServiceError};
pub use service::plant_service::{PlantRecord, PlantService, PlantServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
