//! Care use-case service.
//!
//! # Responsibility
//! - Validate and record care events against existing plants.
//! - Provide the listing, shortcut and statistics use-cases over care.
//!
//! # Invariants
//! - Registration checks field rules before plant existence.
//! - A care event's plant and creation time never change after insert.
//! - `recent` on returned records is derived from the clock, never stored.

use crate::clock::{Clock, SystemClock};
use crate::lifecycle;
use crate::model::care::{CareEvent, CareId, CareInput, CareKind, CareValidationError};
use crate::model::plant::PlantId;
use crate::repo::care_repo::{
    CareEntry, CareListQuery, CareOrder, CareRepository, KindCount, MonthCount, PlantCareCount,
};
use crate::repo::plant_repo::PlantRepository;
use crate::repo::RepoError;
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

#[derive(Debug)]
pub enum CareServiceError {
    Validation(CareValidationError),
    PlantNotFound(PlantId),
    CareNotFound(CareId),
    Repo(RepoError),
    InconsistentState(&'static str),
}

impl CareServiceError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether either the plant or the care event was unknown.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PlantNotFound(_) | Self::CareNotFound(_))
    }
}

impl Display for CareServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::PlantNotFound(id) => write!(f, "plant not found: {id}"),
            Self::CareNotFound(id) => write!(f, "care event not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent care state: {details}"),
        }
    }
}

impl Error for CareServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CareValidationError> for CareServiceError {
    fn from(value: CareValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for CareServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::PlantNotFound(id) => Self::PlantNotFound(id),
            RepoError::CareNotFound(id) => Self::CareNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub type CareServiceResult<T> = Result<T, CareServiceError>;

/// Care read model: stored event, plant name and the derived recent flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareRecord {
    #[serde(flatten)]
    pub entry: CareEntry,
    /// Performed within the trailing seven days.
    pub recent: bool,
}

impl CareRecord {
    pub fn event(&self) -> &CareEvent {
        &self.entry.event
    }
}

/// Care service facade over plant and care repositories.
pub struct CareService<P: PlantRepository, R: CareRepository, C: Clock = SystemClock> {
    plants: P,
    repo: R,
    clock: C,
}

impl<P: PlantRepository, R: CareRepository> CareService<P, R> {
    pub fn new(plants: P, repo: R) -> Self {
        Self::with_clock(plants, repo, SystemClock)
    }
}

impl<P: PlantRepository, R: CareRepository, C: Clock> CareService<P, R, C> {
    pub fn with_clock(plants: P, repo: R, clock: C) -> Self {
        Self {
            plants,
            repo,
            clock,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Validates and records a new care event.
    ///
    /// # Errors
    /// - `Validation` for a missing plant id, date or kind, or a future date.
    /// - `PlantNotFound` when the referenced plant does not exist.
    pub fn register(&self, input: CareInput) -> CareServiceResult<CareRecord> {
        let valid = input.validate(self.today())?;
        self.ensure_plant(valid.plant_uuid)?;

        let event = CareEvent {
            uuid: Uuid::new_v4(),
            plant_uuid: valid.plant_uuid,
            performed_on: valid.performed_on,
            kind: valid.kind,
            notes: valid.notes,
            performed_by: valid.performed_by,
            created_at: self.clock.now(),
        };
        let id = self.repo.create_care(&event)?;
        info!(
            "event=care_register module=service status=ok care={} plant={} kind={}",
            id, event.plant_uuid, event.kind
        );
        self.read_back(id, "registered care not found in read-back")
    }

    /// Replaces date, kind, notes and actor of an existing event.
    pub fn update(&self, id: CareId, mut input: CareInput) -> CareServiceResult<CareRecord> {
        let existing = self
            .repo
            .get_care(id)?
            .ok_or(CareServiceError::CareNotFound(id))?;
        if input.plant_uuid.is_none() {
            input.plant_uuid = Some(existing.event.plant_uuid);
        }
        let valid = input.validate(self.today())?;

        let event = CareEvent {
            performed_on: valid.performed_on,
            kind: valid.kind,
            notes: valid.notes,
            performed_by: valid.performed_by,
            ..existing.event
        };
        self.repo.update_care(&event)?;
        info!("event=care_update module=service status=ok care={id}");
        self.read_back(id, "updated care not found in read-back")
    }

    pub fn delete(&self, id: CareId) -> CareServiceResult<()> {
        self.repo.delete_care(id)?;
        info!("event=care_delete module=service status=ok care={id}");
        Ok(())
    }

    pub fn get(&self, id: CareId) -> CareServiceResult<Option<CareRecord>> {
        let today = self.today();
        Ok(self.repo.get_care(id)?.map(|entry| to_record(entry, today)))
    }

    /// Every care event, newest performed date first.
    pub fn list_all(&self) -> CareServiceResult<Vec<CareRecord>> {
        self.list(&CareListQuery::default())
    }

    /// Care history of one plant. Unknown plants yield an empty list.
    pub fn list_for_plant(&self, plant_uuid: PlantId) -> CareServiceResult<Vec<CareRecord>> {
        self.list(&CareListQuery {
            plant_uuid: Some(plant_uuid),
            ..CareListQuery::default()
        })
    }

    pub fn list_by_kind(&self, kind: CareKind) -> CareServiceResult<Vec<CareRecord>> {
        self.list(&CareListQuery {
            kind: Some(kind),
            ..CareListQuery::default()
        })
    }

    /// Care performed between `start` and `end`, both inclusive.
    pub fn list_in_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CareServiceResult<Vec<CareRecord>> {
        if start > end {
            return Err(CareValidationError::InvertedRange { start, end }.into());
        }
        self.list(&CareListQuery {
            from: Some(start),
            to: Some(end),
            ..CareListQuery::default()
        })
    }

    /// Care performed within the trailing seven days.
    pub fn list_recent(&self) -> CareServiceResult<Vec<CareRecord>> {
        self.list(&CareListQuery {
            from: Some(lifecycle::recent_window_start(self.today())),
            ..CareListQuery::default()
        })
    }

    /// Care performed today, most recently recorded first.
    pub fn list_today(&self) -> CareServiceResult<Vec<CareRecord>> {
        let today = self.today();
        self.list(&CareListQuery {
            from: Some(today),
            to: Some(today),
            order: CareOrder::CreatedDesc,
            ..CareListQuery::default()
        })
    }

    /// Care recorded by one actor, exact match.
    pub fn list_by_actor(&self, performed_by: &str) -> CareServiceResult<Vec<CareRecord>> {
        self.list(&CareListQuery {
            performed_by: Some(performed_by.trim().to_string()),
            ..CareListQuery::default()
        })
    }

    pub fn record_watering(
        &self,
        plant_uuid: PlantId,
        notes: Option<String>,
        performed_by: Option<String>,
    ) -> CareServiceResult<CareRecord> {
        self.record_now(plant_uuid, CareKind::Watering, notes, performed_by)
    }

    pub fn record_pruning(
        &self,
        plant_uuid: PlantId,
        notes: Option<String>,
        performed_by: Option<String>,
    ) -> CareServiceResult<CareRecord> {
        self.record_now(plant_uuid, CareKind::Pruning, notes, performed_by)
    }

    pub fn record_harvest(
        &self,
        plant_uuid: PlantId,
        notes: Option<String>,
        performed_by: Option<String>,
    ) -> CareServiceResult<CareRecord> {
        self.record_now(plant_uuid, CareKind::Harvest, notes, performed_by)
    }

    /// Most recent care of `kind` on one plant, if any.
    pub fn last_of_kind(
        &self,
        plant_uuid: PlantId,
        kind: CareKind,
    ) -> CareServiceResult<Option<CareRecord>> {
        self.ensure_plant(plant_uuid)?;
        let mut latest = self.list(&CareListQuery {
            plant_uuid: Some(plant_uuid),
            kind: Some(kind),
            limit: Some(1),
            ..CareListQuery::default()
        })?;
        Ok(latest.pop())
    }

    /// Whether care of `kind` was already logged for a plant on `date`.
    pub fn exists_on_date(
        &self,
        plant_uuid: PlantId,
        kind: CareKind,
        date: NaiveDate,
    ) -> CareServiceResult<bool> {
        self.ensure_plant(plant_uuid)?;
        Ok(self.repo.care_exists_on(plant_uuid, kind, date)?)
    }

    pub fn stats_by_kind(&self) -> CareServiceResult<Vec<KindCount>> {
        Ok(self.repo.count_by_kind()?)
    }

    pub fn stats_by_plant(&self) -> CareServiceResult<Vec<PlantCareCount>> {
        Ok(self.repo.count_by_plant()?)
    }

    pub fn stats_by_month(&self) -> CareServiceResult<Vec<MonthCount>> {
        Ok(self.repo.count_by_month()?)
    }

    fn record_now(
        &self,
        plant_uuid: PlantId,
        kind: CareKind,
        notes: Option<String>,
        performed_by: Option<String>,
    ) -> CareServiceResult<CareRecord> {
        let input = CareInput::new(plant_uuid, self.today(), kind)
            .with_notes(notes)
            .with_performed_by(performed_by);
        self.register(input)
    }

    fn ensure_plant(&self, plant_uuid: PlantId) -> CareServiceResult<()> {
        if self.plants.plant_exists(plant_uuid)? {
            Ok(())
        } else {
            Err(CareServiceError::PlantNotFound(plant_uuid))
        }
    }

    fn list(&self, query: &CareListQuery) -> CareServiceResult<Vec<CareRecord>> {
        let today = self.today();
        Ok(self
            .repo
            .list_care(query)?
            .into_iter()
            .map(|entry| to_record(entry, today))
            .collect())
    }

    fn read_back(&self, id: CareId, details: &'static str) -> CareServiceResult<CareRecord> {
        let entry = self
            .repo
            .get_care(id)?
            .ok_or(CareServiceError::InconsistentState(details))?;
        Ok(to_record(entry, self.today()))
    }
}

fn to_record(entry: CareEntry, today: NaiveDate) -> CareRecord {
    let recent = lifecycle::is_recent(entry.event.performed_on, today);
    CareRecord { entry, recent }
}
