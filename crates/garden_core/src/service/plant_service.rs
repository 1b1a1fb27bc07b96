//! Plant use-case service.
//!
//! # Responsibility
//! - Validate plant input against the injected clock and persist it.
//! - Attach lifecycle-derived fields to every plant it returns.
//! - Answer the due-for-action queries through the lifecycle calculator.
//!
//! # Invariants
//! - `update` is a full-field replacement; omitted intervals reset to their
//!   defaults.
//! - Due and harvest-ready sets use inclusive `today >= date` comparisons.
//! - Derived fields are computed per call and never persisted.

use crate::clock::{Clock, SystemClock};
use crate::lifecycle::Lifecycle;
use crate::model::plant::{Plant, PlantId, PlantInput, PlantValidationError};
use crate::repo::plant_repo::{PlantListQuery, PlantRepository, TypeCount};
use crate::repo::RepoError;
use chrono::{Days, NaiveDate};
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Service error for plant use-cases.
#[derive(Debug)]
pub enum PlantServiceError {
    /// Input rejected before reaching storage.
    Validation(PlantValidationError),
    /// Target plant does not exist.
    PlantNotFound(PlantId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// A write succeeded but its read-back did not.
    InconsistentState(&'static str),
}

impl PlantServiceError {
    /// Whether the caller sent bad input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether the caller referenced an unknown plant.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PlantNotFound(_))
    }
}

impl Display for PlantServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::PlantNotFound(id) => write!(f, "plant not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent plant state: {details}"),
        }
    }
}

impl Error for PlantServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PlantValidationError> for PlantServiceError {
    fn from(value: PlantValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for PlantServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::PlantNotFound(id) => Self::PlantNotFound(id),
            RepoError::InvalidPlant(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

pub type PlantServiceResult<T> = Result<T, PlantServiceError>;

/// Plant read model: stored fields plus derived lifecycle values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantRecord {
    #[serde(flatten)]
    pub plant: Plant,
    #[serde(flatten)]
    pub lifecycle: Lifecycle,
    /// Number of care events logged against this plant.
    pub total_care: u32,
}

/// Plant service facade over repository implementations.
pub struct PlantService<R: PlantRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
}

impl<R: PlantRepository> PlantService<R> {
    /// Creates a service reading "today" from the wall clock.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: PlantRepository, C: Clock> PlantService<R, C> {
    /// Creates a service with an explicit clock.
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// The date every rule in this service is evaluated against.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Validates and stores a new plant.
    ///
    /// # Errors
    /// - `Validation` when name/type are blank, planting date is missing or in
    ///   the future, or a numeric field is not positive.
    pub fn create(&self, input: PlantInput) -> PlantServiceResult<PlantRecord> {
        let today = self.today();
        let plant = input.into_plant(Uuid::new_v4(), today)?;
        let id = self.repo.create_plant(&plant)?;
        info!(
            "event=plant_create module=service status=ok plant={} type={}",
            id, plant.plant_type
        );
        self.read_back(id, today, "created plant not found in read-back")
    }

    /// Replaces every field of an existing plant.
    ///
    /// Unknown ids fail with `PlantNotFound` before input is validated.
    pub fn update(&self, id: PlantId, input: PlantInput) -> PlantServiceResult<PlantRecord> {
        if !self.repo.plant_exists(id)? {
            return Err(PlantServiceError::PlantNotFound(id));
        }
        let today = self.today();
        let plant = input.into_plant(id, today)?;
        self.repo.update_plant(&plant)?;
        info!("event=plant_update module=service status=ok plant={id}");
        self.read_back(id, today, "updated plant not found in read-back")
    }

    /// Deletes a plant together with its care history.
    pub fn delete(&self, id: PlantId) -> PlantServiceResult<()> {
        self.repo.delete_plant(id)?;
        Ok(())
    }

    /// Gets one plant with derived fields, or `None` when unknown.
    pub fn get(&self, id: PlantId) -> PlantServiceResult<Option<PlantRecord>> {
        let today = self.today();
        match self.repo.get_plant(id)? {
            Some(plant) => Ok(Some(self.to_record(plant, today)?)),
            None => Ok(None),
        }
    }

    pub fn list_all(&self) -> PlantServiceResult<Vec<PlantRecord>> {
        self.list(&PlantListQuery::default())
    }

    /// Plants whose name contains `fragment`, ignoring case.
    pub fn find_by_name_contains(&self, fragment: &str) -> PlantServiceResult<Vec<PlantRecord>> {
        self.list(&PlantListQuery {
            name_contains: Some(fragment.to_string()),
            ..PlantListQuery::default()
        })
    }

    pub fn find_by_type(&self, plant_type: &str) -> PlantServiceResult<Vec<PlantRecord>> {
        self.list(&PlantListQuery {
            plant_type: Some(plant_type.to_string()),
            ..PlantListQuery::default()
        })
    }

    pub fn find_by_region(&self, region: &str) -> PlantServiceResult<Vec<PlantRecord>> {
        self.list(&PlantListQuery {
            region: Some(region.to_string()),
            ..PlantListQuery::default()
        })
    }

    pub fn find_by_type_and_region(
        &self,
        plant_type: &str,
        region: &str,
    ) -> PlantServiceResult<Vec<PlantRecord>> {
        self.list(&PlantListQuery {
            plant_type: Some(plant_type.to_string()),
            region: Some(region.to_string()),
            ..PlantListQuery::default()
        })
    }

    /// Plants already grown in `region`, offered as planting suggestions.
    pub fn suggest_for_region(&self, region: &str) -> PlantServiceResult<Vec<PlantRecord>> {
        self.find_by_region(region)
    }

    /// Whether any plant carries `name`, ignoring case.
    pub fn exists_by_name(&self, name: &str) -> PlantServiceResult<bool> {
        let matches = self.repo.list_plants(&PlantListQuery {
            name: Some(name.to_string()),
            ..PlantListQuery::default()
        })?;
        Ok(!matches.is_empty())
    }

    /// Plants planted on or after `today - days`, newest first.
    pub fn find_planted_within_last_days(&self, days: u32) -> PlantServiceResult<Vec<PlantRecord>> {
        let since = self
            .today()
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        self.list(&PlantListQuery {
            planted_since: Some(since),
            ..PlantListQuery::default()
        })
    }

    /// Plants whose next watering date is on or before `today`.
    pub fn find_due_for_watering(&self, today: NaiveDate) -> PlantServiceResult<Vec<PlantRecord>> {
        self.filter_all(today, |lifecycle| lifecycle.due_for_watering)
    }

    /// Plants whose next pruning date is on or before `today`.
    pub fn find_due_for_pruning(&self, today: NaiveDate) -> PlantServiceResult<Vec<PlantRecord>> {
        self.filter_all(today, |lifecycle| lifecycle.due_for_pruning)
    }

    /// Plants whose harvest date is on or before `today`.
    pub fn find_ready_for_harvest(&self, today: NaiveDate) -> PlantServiceResult<Vec<PlantRecord>> {
        self.filter_all(today, |lifecycle| lifecycle.ready_for_harvest)
    }

    /// Plant counts grouped by type, largest group first.
    pub fn stats_by_type(&self) -> PlantServiceResult<Vec<TypeCount>> {
        Ok(self.repo.count_by_type()?)
    }

    fn list(&self, query: &PlantListQuery) -> PlantServiceResult<Vec<PlantRecord>> {
        let today = self.today();
        self.repo
            .list_plants(query)?
            .into_iter()
            .map(|plant| self.to_record(plant, today))
            .collect()
    }

    fn filter_all(
        &self,
        today: NaiveDate,
        predicate: impl Fn(&Lifecycle) -> bool,
    ) -> PlantServiceResult<Vec<PlantRecord>> {
        let mut matching = Vec::new();
        for plant in self.repo.list_plants(&PlantListQuery::default())? {
            if predicate(&Lifecycle::of(&plant, today)) {
                matching.push(self.to_record(plant, today)?);
            }
        }
        Ok(matching)
    }

    fn to_record(&self, plant: Plant, today: NaiveDate) -> PlantServiceResult<PlantRecord> {
        let total_care = self.repo.count_care_events(plant.uuid)?;
        Ok(PlantRecord {
            lifecycle: Lifecycle::of(&plant, today),
            plant,
            total_care,
        })
    }

    fn read_back(
        &self,
        id: PlantId,
        today: NaiveDate,
        details: &'static str,
    ) -> PlantServiceResult<PlantRecord> {
        let plant = self
            .repo
            .get_plant(id)?
            .ok_or(PlantServiceError::InconsistentState(details))?;
        self.to_record(plant, today)
    }
}
