//! Subcommand handlers.
//!
//! Each handler opens its own connection, builds the services it needs and
//! prints either human-readable lines or JSON.

use crate::cli::{
    AlertsCommand, CareCommand, CareFields, CareFilter, CareStatsBy, DueKind, PlantCommand,
    PlantFields, PlantFilter, QuickCare,
};
use anyhow::{bail, Context, Result};
use chrono::Local;
use garden_core::alert::{
    next_job_after, AlertBatch, AlertJob, AlertSink, SinkError, WeeklySummary,
};
use garden_core::db::Connection;
use garden_core::{
    open_db, AlertRunner, CareInput, CareRecord, CareService, CheckOutcome, LogSink, PlantInput,
    PlantRecord, PlantService, SqliteCareRepository, SqlitePlantRepository,
};
use log::{error, info};
use serde::Serialize;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::path::Path;

pub fn plant(db: &Path, command: PlantCommand, json: bool) -> Result<()> {
    let conn = connect(db)?;
    let service = PlantService::new(SqlitePlantRepository::try_new(&conn)?);

    match command {
        PlantCommand::Add(fields) => emit(&service.create(plant_input(fields))?, json, print_plant),
        PlantCommand::Update { id, fields } => {
            emit(&service.update(id, plant_input(fields))?, json, print_plant)
        }
        PlantCommand::Show { id } => match service.get(id)? {
            Some(record) => emit(&record, json, print_plant),
            None => bail!("plant not found: {id}"),
        },
        PlantCommand::Delete { id } => {
            service.delete(id)?;
            emit(&json!({ "deleted": id }), json, |_| println!("deleted plant {id}"))
        }
        PlantCommand::List(filter) => {
            let records = match filter {
                PlantFilter {
                    name: Some(fragment),
                    ..
                } => service.find_by_name_contains(&fragment)?,
                PlantFilter {
                    recent_days: Some(days),
                    ..
                } => service.find_planted_within_last_days(days)?,
                PlantFilter {
                    plant_type: Some(plant_type),
                    region: Some(region),
                    ..
                } => service.find_by_type_and_region(&plant_type, &region)?,
                PlantFilter {
                    plant_type: Some(plant_type),
                    ..
                } => service.find_by_type(&plant_type)?,
                PlantFilter {
                    region: Some(region),
                    ..
                } => service.find_by_region(&region)?,
                _ => service.list_all()?,
            };
            emit(&records, json, |records| print_plants(records))
        }
        PlantCommand::Due { what, on } => {
            let today = on.unwrap_or_else(|| service.today());
            let records = match what {
                DueKind::Watering => service.find_due_for_watering(today)?,
                DueKind::Pruning => service.find_due_for_pruning(today)?,
                DueKind::Harvest => service.find_ready_for_harvest(today)?,
            };
            emit(&records, json, |records| print_plants(records))
        }
        PlantCommand::Stats => emit(&service.stats_by_type()?, json, |counts| {
            for entry in counts {
                println!("{:<20} {}", entry.plant_type, entry.count);
            }
        }),
        PlantCommand::Suggest { region } => {
            let records = service.suggest_for_region(&region)?;
            emit(&records, json, |records| print_plants(records))
        }
    }
}

pub fn care(db: &Path, command: CareCommand, json: bool) -> Result<()> {
    let conn = connect(db)?;
    let service = CareService::new(
        SqlitePlantRepository::try_new(&conn)?,
        SqliteCareRepository::try_new(&conn)?,
    );

    match command {
        CareCommand::Add(fields) => emit(&service.register(care_input(fields))?, json, print_care),
        CareCommand::Update {
            id,
            date,
            kind,
            notes,
            performed_by,
        } => {
            let input = CareInput {
                plant_uuid: None,
                performed_on: date,
                kind,
                notes,
                performed_by,
            };
            emit(&service.update(id, input)?, json, print_care)
        }
        CareCommand::Show { id } => match service.get(id)? {
            Some(record) => emit(&record, json, print_care),
            None => bail!("care event not found: {id}"),
        },
        CareCommand::Delete { id } => {
            service.delete(id)?;
            emit(&json!({ "deleted": id }), json, |_| println!("deleted care event {id}"))
        }
        CareCommand::List(filter) => {
            let records = list_care(&service, filter)?;
            emit(&records, json, |records| print_care_list(records))
        }
        CareCommand::Water(quick) => {
            let QuickCare {
                plant,
                notes,
                performed_by,
            } = quick;
            emit(&service.record_watering(plant, notes, performed_by)?, json, print_care)
        }
        CareCommand::Prune(quick) => {
            let QuickCare {
                plant,
                notes,
                performed_by,
            } = quick;
            emit(&service.record_pruning(plant, notes, performed_by)?, json, print_care)
        }
        CareCommand::Harvest(quick) => {
            let QuickCare {
                plant,
                notes,
                performed_by,
            } = quick;
            emit(&service.record_harvest(plant, notes, performed_by)?, json, print_care)
        }
        CareCommand::Stats { by } => match by {
            CareStatsBy::Kind => emit(&service.stats_by_kind()?, json, |counts| {
                for entry in counts {
                    println!("{:<14} {}", entry.kind.as_str(), entry.count);
                }
            }),
            CareStatsBy::Plant => emit(&service.stats_by_plant()?, json, |counts| {
                for entry in counts {
                    println!("{}  {:<20} {}", entry.plant_uuid, entry.plant_name, entry.count);
                }
            }),
            CareStatsBy::Month => emit(&service.stats_by_month()?, json, |counts| {
                for entry in counts {
                    println!("{:04}-{:02}  {}", entry.year, entry.month, entry.count);
                }
            }),
        },
        CareCommand::Last { plant, kind } => match service.last_of_kind(plant, kind)? {
            Some(record) => emit(&record, json, print_care),
            None => emit(&json!(null), json, |_| println!("no {kind} recorded for {plant}")),
        },
    }
}

pub fn alerts(db: &Path, command: AlertsCommand, json: bool) -> Result<()> {
    match command {
        AlertsCommand::Check { job } => {
            let sink = PrintSink::new(json);
            let outcome = run_job(db, job, &sink)?;
            let report = json!({ "job": job, "outcome": outcome, "alerts": sink.into_payloads() });
            emit(&report, json, |_| println!("{job}: {}", describe(&outcome)))
        }
        AlertsCommand::Test => {
            let conn = connect(db)?;
            let plants = PlantService::new(SqlitePlantRepository::try_new(&conn)?);
            let sink = PrintSink::new(json);
            let outcomes = AlertRunner::new(plants, &sink).test_all();
            let report = json!({ "outcomes": outcomes, "alerts": sink.into_payloads() });
            emit(&report, json, |_| {
                for (job, outcome) in &outcomes {
                    println!("{job}: {}", describe(outcome));
                }
            })
        }
        AlertsCommand::Schedule => {
            let now = Local::now().naive_local();
            let upcoming: Vec<_> = AlertJob::ALL
                .into_iter()
                .filter_map(|job| job.next_fire_after(now).map(|at| (job, at)))
                .collect();
            emit(&upcoming, json, |upcoming| {
                for (job, at) in upcoming {
                    println!("{:<10} {}", job.as_str(), at.format("%Y-%m-%d %H:%M"));
                }
            })
        }
        AlertsCommand::Daemon => daemon(db),
    }
}

fn daemon(db: &Path) -> Result<()> {
    info!("event=alert_daemon module=cli status=start db={}", db.display());
    loop {
        let now = Local::now().naive_local();
        let (job, at) = next_job_after(now).context("no alert job is scheduled")?;
        let wait = (at - now).to_std().unwrap_or_default();
        info!("event=alert_daemon module=cli status=waiting job={job} at={at}");
        std::thread::sleep(wait);

        match run_job(db, job, LogSink) {
            Ok(outcome) => info!(
                "event=alert_daemon module=cli status=ran job={} outcome={}",
                job,
                describe(&outcome)
            ),
            Err(err) => error!("event=alert_daemon module=cli status=error job={job} error={err:#}"),
        }
    }
}

/// Runs one job on a fresh connection.
fn run_job<S: AlertSink>(db: &Path, job: AlertJob, sink: S) -> Result<CheckOutcome> {
    let conn = connect(db)?;
    let plants = PlantService::new(SqlitePlantRepository::try_new(&conn)?);
    Ok(AlertRunner::new(plants, sink).run(job))
}

fn connect(db: &Path) -> Result<Connection> {
    open_db(db).with_context(|| format!("cannot open garden database `{}`", db.display()))
}

fn list_care<P, R>(service: &CareService<P, R>, filter: CareFilter) -> Result<Vec<CareRecord>>
where
    P: garden_core::PlantRepository,
    R: garden_core::CareRepository,
{
    let records = match filter {
        CareFilter {
            plant: Some(plant), ..
        } => service.list_for_plant(plant)?,
        CareFilter {
            kind: Some(kind), ..
        } => service.list_by_kind(kind)?,
        CareFilter {
            from: Some(from),
            to: Some(to),
            ..
        } => service.list_in_date_range(from, to)?,
        CareFilter { by: Some(actor), .. } => service.list_by_actor(&actor)?,
        CareFilter { recent: true, .. } => service.list_recent()?,
        CareFilter { today: true, .. } => service.list_today()?,
        _ => service.list_all()?,
    };
    Ok(records)
}

fn plant_input(fields: PlantFields) -> PlantInput {
    PlantInput {
        name: fields.name,
        plant_type: fields.plant_type,
        planted_on: fields.planted_on,
        cycle_days: fields.cycle_days,
        region: fields.region,
        description: fields.description,
        watering_interval_days: fields.watering_days,
        pruning_interval_days: fields.pruning_days,
    }
}

fn care_input(fields: CareFields) -> CareInput {
    CareInput {
        plant_uuid: Some(fields.plant),
        performed_on: fields.date,
        kind: fields.kind,
        notes: fields.notes,
        performed_by: fields.performed_by,
    }
}

fn emit<T: Serialize + ?Sized>(value: &T, json: bool, human: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human(value);
    }
    Ok(())
}

fn print_plant(record: &PlantRecord) {
    let plant = &record.plant;
    let life = &record.lifecycle;
    println!("{}  {} ({})", plant.uuid, plant.name, plant.plant_type);
    println!("  planted      {}", plant.planted_on);
    if let Some(region) = plant.region.as_deref() {
        println!("  region       {region}");
    }
    println!(
        "  water        {} every {}d{}",
        life.next_watering,
        plant.watering_interval_days,
        flag(life.due_for_watering, "due")
    );
    println!(
        "  prune        {} every {}d{}",
        life.next_pruning,
        plant.pruning_interval_days,
        flag(life.due_for_pruning, "due")
    );
    match life.harvest_date {
        Some(date) => println!("  harvest      {date}{}", flag(life.ready_for_harvest, "ready")),
        None => println!("  harvest      -"),
    }
    println!("  care events  {}", record.total_care);
}

fn print_plants(records: &[PlantRecord]) {
    if records.is_empty() {
        println!("no plants");
    }
    for record in records {
        println!(
            "{}  {:<20} {:<12} {}",
            record.plant.uuid, record.plant.name, record.plant.plant_type, record.plant.planted_on
        );
    }
}

fn print_care(record: &CareRecord) {
    let event = record.event();
    println!(
        "{}  {} {} on {}{}",
        event.uuid,
        event.kind.label(),
        record.entry.plant_name,
        event.performed_on,
        flag(record.recent, "recent")
    );
    if let Some(actor) = event.performed_by.as_deref() {
        println!("  by     {actor}");
    }
    if let Some(notes) = event.notes.as_deref() {
        println!("  notes  {notes}");
    }
}

fn print_care_list(records: &[CareRecord]) {
    if records.is_empty() {
        println!("no care events");
    }
    for record in records {
        let event = record.event();
        println!(
            "{}  {}  {:<13} {}",
            event.uuid,
            event.performed_on,
            event.kind.as_str(),
            record.entry.plant_name
        );
    }
}

fn flag(set: bool, label: &str) -> String {
    if set {
        format!(" [{label}]")
    } else {
        String::new()
    }
}

fn describe(outcome: &CheckOutcome) -> String {
    match outcome {
        CheckOutcome::Delivered(count) => format!("{count} plant(s) reported"),
        CheckOutcome::NothingDue => "nothing to report".to_string(),
        CheckOutcome::Skipped => "skipped".to_string(),
        CheckOutcome::Failed(message) => format!("failed: {message}"),
    }
}

/// Sink that prints alert payloads to stdout.
///
/// In JSON mode payloads are collected instead, so the command can print one
/// document holding both the payloads and the outcome.
struct PrintSink {
    json: bool,
    payloads: RefCell<Vec<Value>>,
}

impl PrintSink {
    fn new(json: bool) -> Self {
        Self {
            json,
            payloads: RefCell::new(Vec::new()),
        }
    }

    fn collect<T: Serialize>(&self, payload: &T) -> Result<(), SinkError> {
        let value = serde_json::to_value(payload).map_err(|err| SinkError(err.to_string()))?;
        self.payloads.borrow_mut().push(value);
        Ok(())
    }

    fn into_payloads(self) -> Vec<Value> {
        self.payloads.into_inner()
    }
}

impl AlertSink for PrintSink {
    fn deliver(&self, batch: &AlertBatch) -> Result<(), SinkError> {
        if self.json {
            return self.collect(batch);
        }
        println!("{} alert for {}:", batch.kind, batch.today);
        for plant in &batch.plants {
            match plant.cycle_days {
                Some(cycle) => println!(
                    "  {}  {} planted {} ({cycle}-day cycle)",
                    plant.plant_uuid, plant.name, plant.planted_on
                ),
                None => println!("  {}  {} planted {}", plant.plant_uuid, plant.name, plant.planted_on),
            }
        }
        Ok(())
    }

    fn deliver_summary(&self, summary: &WeeklySummary) -> Result<(), SinkError> {
        if self.json {
            return self.collect(summary);
        }
        println!("weekly summary for {}", summary.today);
        println!("  plants               {}", summary.total_plants);
        println!("  planted last 7 days  {}", summary.planted_last_week);
        for entry in &summary.by_type {
            println!("  {:<20} {}", entry.plant_type, entry.count);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn fields(name: &str, planted_days_ago: i64) -> PlantFields {
        PlantFields {
            name: name.to_string(),
            plant_type: "vegetable".to_string(),
            planted_on: Some(Local::now().date_naive() - Duration::days(planted_days_ago)),
            cycle_days: None,
            region: None,
            description: None,
            watering_days: None,
            pruning_days: None,
        }
    }

    fn only_plant(db: &Path) -> PlantRecord {
        let conn = open_db(db).unwrap();
        let service = PlantService::new(SqlitePlantRepository::try_new(&conn).unwrap());
        let mut plants = service.list_all().unwrap();
        assert_eq!(plants.len(), 1);
        plants.remove(0)
    }

    #[test]
    fn plant_and_care_commands_persist() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("garden.sqlite3");

        plant(&db, PlantCommand::Add(fields("Tomato", 2)), true).unwrap();
        let tomato = only_plant(&db);
        assert_eq!(tomato.plant.name, "Tomato");

        let quick = QuickCare {
            plant: tomato.plant.uuid,
            notes: None,
            performed_by: Some("ana".to_string()),
        };
        care(&db, CareCommand::Water(quick), false).unwrap();

        let conn = open_db(&db).unwrap();
        let service = CareService::new(
            SqlitePlantRepository::try_new(&conn).unwrap(),
            SqliteCareRepository::try_new(&conn).unwrap(),
        );
        let history = service.list_for_plant(tomato.plant.uuid).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].event().performed_by.as_deref(), Some("ana"));
        assert!(history[0].recent);
    }

    #[test]
    fn missing_records_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("garden.sqlite3");

        assert!(plant(&db, PlantCommand::Show { id: Uuid::nil() }, false).is_err());
        assert!(plant(&db, PlantCommand::Delete { id: Uuid::nil() }, false).is_err());
        assert!(care(&db, CareCommand::Show { id: Uuid::nil() }, true).is_err());
    }

    #[test]
    fn json_sink_collects_payloads_for_one_report() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("garden.sqlite3");
        plant(&db, PlantCommand::Add(fields("Radish", 10)), false).unwrap();

        let sink = PrintSink::new(true);
        let outcome = run_job(&db, AlertJob::Watering, &sink).unwrap();
        assert_eq!(outcome, CheckOutcome::Delivered(1));
        assert_eq!(run_job(&db, AlertJob::Pruning, &sink).unwrap(), CheckOutcome::NothingDue);

        let payloads = sink.into_payloads();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0]["kind"], "watering");
        assert_eq!(payloads[0]["plants"][0]["name"], "Radish");
    }

    #[test]
    fn alerts_check_and_schedule_run_against_a_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("garden.sqlite3");

        alerts(&db, AlertsCommand::Check { job: AlertJob::Harvest }, true).unwrap();
        alerts(&db, AlertsCommand::Test, true).unwrap();
        alerts(&db, AlertsCommand::Schedule, false).unwrap();
    }
}
