use chrono::NaiveDate;
use garden_core::alert::{AlertBatch, AlertSink, SinkError, WeeklySummary};
use garden_core::db::open_db_in_memory;
use garden_core::{
    AlertJob, AlertKind, AlertRunner, CheckOutcome, FixedClock, LogSink, PlantInput, PlantService,
    SqlitePlantRepository,
};
use rusqlite::Connection;
use std::cell::RefCell;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// A Monday.
fn today() -> NaiveDate {
    date(2024, 6, 17)
}

fn plants(conn: &Connection) -> PlantService<SqlitePlantRepository<'_>, FixedClock> {
    PlantService::with_clock(
        SqlitePlantRepository::try_new(conn).unwrap(),
        FixedClock::on(today()),
    )
}

fn seed(conn: &Connection) {
    let service = plants(conn);
    // Watering due, harvest ready today.
    let mut radish = PlantInput::new("Radish", "vegetable", date(2024, 5, 18));
    radish.cycle_days = Some(30);
    radish.pruning_interval_days = Some(60);
    service.create(radish).unwrap();
    // Watering due, pruning due today.
    service
        .create(PlantInput::new("Rose", "flower", date(2024, 5, 18)))
        .unwrap();
    // Nothing due.
    service
        .create(PlantInput::new("Basil", "herb", today()))
        .unwrap();
}

#[derive(Default)]
struct RecordingSink {
    batches: RefCell<Vec<AlertBatch>>,
    summaries: RefCell<Vec<WeeklySummary>>,
    fail_on: Option<AlertKind>,
}

impl AlertSink for RecordingSink {
    fn deliver(&self, batch: &AlertBatch) -> Result<(), SinkError> {
        if self.fail_on == Some(batch.kind) {
            return Err(SinkError(format!("{} channel down", batch.kind)));
        }
        self.batches.borrow_mut().push(batch.clone());
        Ok(())
    }

    fn deliver_summary(&self, summary: &WeeklySummary) -> Result<(), SinkError> {
        self.summaries.borrow_mut().push(summary.clone());
        Ok(())
    }
}

#[test]
fn checks_deliver_one_batch_per_kind() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let sink = RecordingSink::default();
    let runner = AlertRunner::new(plants(&conn), &sink);

    assert_eq!(runner.check_watering(), CheckOutcome::Delivered(2));
    assert_eq!(runner.check_pruning(), CheckOutcome::Delivered(1));
    assert_eq!(runner.check_harvest(), CheckOutcome::Delivered(1));

    let batches = sink.batches.borrow();
    assert_eq!(batches.len(), 3);
    assert_eq!(batches[0].kind, AlertKind::Watering);
    assert_eq!(batches[0].today, today());
    assert!(batches[0].plants.iter().all(|plant| plant.cycle_days.is_none()));

    assert_eq!(batches[1].kind, AlertKind::Pruning);
    assert_eq!(batches[1].plants[0].name, "Rose");

    let harvest = &batches[2];
    assert_eq!(harvest.kind, AlertKind::Harvest);
    assert_eq!(harvest.plants[0].name, "Radish");
    assert_eq!(harvest.plants[0].planted_on, date(2024, 5, 18));
    assert_eq!(harvest.plants[0].cycle_days, Some(30));
}

#[test]
fn empty_checks_do_not_call_the_sink() {
    let conn = open_db_in_memory().unwrap();
    let sink = RecordingSink::default();
    let runner = AlertRunner::new(plants(&conn), &sink);

    assert_eq!(runner.check_watering(), CheckOutcome::NothingDue);
    assert_eq!(runner.check_pruning(), CheckOutcome::NothingDue);
    assert_eq!(runner.check_harvest(), CheckOutcome::NothingDue);
    assert!(sink.batches.borrow().is_empty());
}

#[test]
fn sink_failure_is_contained_to_its_check() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let sink = RecordingSink {
        fail_on: Some(AlertKind::Watering),
        ..RecordingSink::default()
    };
    let runner = AlertRunner::new(plants(&conn), &sink);

    let outcomes = runner.test_all();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].0, AlertJob::Watering);
    assert!(outcomes[0].1.is_failed());
    assert_eq!(outcomes[1], (AlertJob::Pruning, CheckOutcome::Delivered(1)));
    assert_eq!(outcomes[2], (AlertJob::Harvest, CheckOutcome::Delivered(1)));
    assert_eq!(sink.batches.borrow().len(), 2);
}

#[test]
fn query_failure_is_reported_not_raised() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let sink = RecordingSink::default();
    let runner = AlertRunner::new(plants(&conn), &sink);

    conn.execute_batch("DROP TABLE care_events;").unwrap();

    match runner.run(AlertJob::Watering) {
        CheckOutcome::Failed(message) => assert!(message.contains("care_events")),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(runner.run(AlertJob::WeeklySummary).is_failed());
    assert_eq!(runner.run(AlertJob::Cleanup), CheckOutcome::Skipped);
    assert!(sink.batches.borrow().is_empty());
}

#[test]
fn weekly_summary_counts_totals_recent_and_types() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    plants(&conn)
        .create(PlantInput::new("Mint", "herb", date(2024, 6, 10)))
        .unwrap();
    let sink = RecordingSink::default();
    let runner = AlertRunner::new(plants(&conn), &sink);

    assert_eq!(runner.weekly_summary(), CheckOutcome::Delivered(4));

    let summaries = sink.summaries.borrow();
    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0];
    assert_eq!(summary.today, today());
    assert_eq!(summary.total_plants, 4);
    assert_eq!(summary.planted_last_week, 2);
    assert_eq!(summary.by_type[0].plant_type, "herb");
    assert_eq!(summary.by_type[0].count, 2);
}

#[test]
fn run_dispatches_every_job_with_log_sink() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let runner = AlertRunner::new(plants(&conn), LogSink);

    for job in AlertJob::ALL {
        assert!(!runner.run(job).is_failed(), "{job} failed");
    }
}
