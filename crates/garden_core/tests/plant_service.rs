use chrono::NaiveDate;
use garden_core::db::open_db_in_memory;
use garden_core::repo::plant_repo::TypeCount;
use garden_core::{
    FixedClock, PlantInput, PlantService, PlantServiceError, PlantValidationError,
    SqlitePlantRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    date(2024, 6, 15)
}

fn service(conn: &Connection) -> PlantService<SqlitePlantRepository<'_>, FixedClock> {
    PlantService::with_clock(
        SqlitePlantRepository::try_new(conn).unwrap(),
        FixedClock::on(today()),
    )
}

#[test]
fn create_applies_defaults_and_derives_lifecycle() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut input = PlantInput::new("  Tomato ", "vegetable", date(2024, 6, 5));
    input.cycle_days = Some(90);
    input.region = Some("   ".to_string());
    let created = service.create(input).unwrap();

    assert_eq!(created.plant.name, "Tomato");
    assert_eq!(created.plant.region, None);
    assert_eq!(created.plant.watering_interval_days, 3);
    assert_eq!(created.plant.pruning_interval_days, 30);
    assert_eq!(created.lifecycle.next_watering, date(2024, 6, 8));
    assert_eq!(created.lifecycle.next_pruning, date(2024, 7, 5));
    assert_eq!(created.lifecycle.harvest_date, Some(date(2024, 9, 3)));
    assert!(created.lifecycle.due_for_watering);
    assert!(!created.lifecycle.due_for_pruning);
    assert!(!created.lifecycle.ready_for_harvest);
    assert_eq!(created.total_care, 0);
}

#[test]
fn create_then_get_round_trips_fields_and_derived_values() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let input = PlantInput {
        name: "Rosemary".to_string(),
        plant_type: "herb".to_string(),
        planted_on: Some(date(2024, 1, 10)),
        cycle_days: None,
        region: Some("South".to_string()),
        description: Some("by the fence".to_string()),
        watering_interval_days: Some(7),
        pruning_interval_days: Some(60),
    };
    let created = service.create(input).unwrap();
    let fetched = service.get(created.plant.uuid).unwrap().unwrap();

    assert_eq!(fetched, created);
    assert_eq!(fetched.lifecycle.harvest_date, None);
    assert!(!fetched.lifecycle.ready_for_harvest);
    assert!(service.get(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn planting_date_after_today_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service
        .create(PlantInput::new("Pepper", "vegetable", date(2024, 6, 16)))
        .unwrap_err();
    assert!(err.is_validation());
    assert!(matches!(
        err,
        PlantServiceError::Validation(PlantValidationError::PlantingDateInFuture { .. })
    ));

    // Planting today is allowed.
    service
        .create(PlantInput::new("Pepper", "vegetable", today()))
        .unwrap();
}

#[test]
fn invalid_fields_are_rejected_before_storage() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let blank_name = service
        .create(PlantInput::new("   ", "herb", today()))
        .unwrap_err();
    assert!(matches!(
        blank_name,
        PlantServiceError::Validation(PlantValidationError::BlankName)
    ));

    let blank_type = service.create(PlantInput::new("Mint", "", today())).unwrap_err();
    assert!(matches!(
        blank_type,
        PlantServiceError::Validation(PlantValidationError::BlankType)
    ));

    let missing_date = service
        .create(PlantInput {
            name: "Mint".to_string(),
            plant_type: "herb".to_string(),
            ..PlantInput::default()
        })
        .unwrap_err();
    assert!(matches!(
        missing_date,
        PlantServiceError::Validation(PlantValidationError::MissingPlantingDate)
    ));

    let mut zero_cycle = PlantInput::new("Mint", "herb", today());
    zero_cycle.cycle_days = Some(0);
    assert!(matches!(
        service.create(zero_cycle).unwrap_err(),
        PlantServiceError::Validation(PlantValidationError::NonPositiveCycle(0))
    ));

    let mut negative_interval = PlantInput::new("Mint", "herb", today());
    negative_interval.watering_interval_days = Some(-2);
    assert!(matches!(
        service.create(negative_interval).unwrap_err(),
        PlantServiceError::Validation(PlantValidationError::NonPositiveInterval {
            field: "watering_interval_days",
            value: -2
        })
    ));

    assert!(service.list_all().unwrap().is_empty());
}

#[test]
fn planted_today_with_defaults_is_not_due_or_ready() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut input = PlantInput::new("Carrot", "vegetable", today());
    input.cycle_days = Some(90);
    let created = service.create(input).unwrap();

    assert!(service.find_due_for_watering(today()).unwrap().is_empty());
    assert!(service.find_due_for_pruning(today()).unwrap().is_empty());
    assert!(service.find_ready_for_harvest(today()).unwrap().is_empty());
    assert!(!created.lifecycle.ready_for_harvest);
}

#[test]
fn due_and_ready_sets_are_inclusive() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut lettuce = PlantInput::new("Lettuce", "vegetable", date(2024, 6, 5));
    lettuce.cycle_days = Some(10);
    let lettuce = service.create(lettuce).unwrap();
    let fern = service
        .create(PlantInput::new("Fern", "ornamental", date(2024, 6, 12)))
        .unwrap();
    let old_rose = service
        .create(PlantInput::new("Rose", "flower", date(2024, 5, 16)))
        .unwrap();

    // Fern: planted 3 days ago with the default 3-day watering interval.
    let watering: Vec<_> = service
        .find_due_for_watering(today())
        .unwrap()
        .into_iter()
        .map(|record| record.plant.uuid)
        .collect();
    assert!(watering.contains(&fern.plant.uuid));
    assert!(watering.contains(&lettuce.plant.uuid));
    assert!(watering.contains(&old_rose.plant.uuid));

    let watering_yesterday: Vec<_> = service
        .find_due_for_watering(date(2024, 6, 14))
        .unwrap()
        .into_iter()
        .map(|record| record.plant.uuid)
        .collect();
    assert!(!watering_yesterday.contains(&fern.plant.uuid));

    // Rose: planted exactly 30 days ago.
    let pruning = service.find_due_for_pruning(today()).unwrap();
    assert_eq!(pruning.len(), 1);
    assert_eq!(pruning[0].plant.uuid, old_rose.plant.uuid);

    // Lettuce: harvest date is today.
    let ready = service.find_ready_for_harvest(today()).unwrap();
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].plant.uuid, lettuce.plant.uuid);
    assert_eq!(ready[0].lifecycle.harvest_date, Some(today()));
    assert!(service
        .find_ready_for_harvest(date(2024, 6, 14))
        .unwrap()
        .is_empty());
}

#[test]
fn update_replaces_all_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut input = PlantInput::new("Basil", "herb", date(2024, 5, 1));
    input.watering_interval_days = Some(2);
    input.region = Some("North".to_string());
    let created = service.create(input).unwrap();

    let replacement = PlantInput::new("Thai basil", "Herb", date(2024, 5, 20));
    let updated = service.update(created.plant.uuid, replacement).unwrap();

    assert_eq!(updated.plant.uuid, created.plant.uuid);
    assert_eq!(updated.plant.name, "Thai basil");
    assert_eq!(updated.plant.plant_type, "Herb");
    assert_eq!(updated.plant.region, None);
    assert_eq!(updated.plant.watering_interval_days, 3);
    assert_eq!(updated.lifecycle.next_watering, date(2024, 5, 23));
}

#[test]
fn update_checks_existence_before_validation() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let missing = Uuid::new_v4();
    let err = service
        .update(missing, PlantInput::new("", "", date(2030, 1, 1)))
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, PlantServiceError::PlantNotFound(id) if id == missing));

    let created = service
        .create(PlantInput::new("Sage", "herb", today()))
        .unwrap();
    let err = service
        .update(
            created.plant.uuid,
            PlantInput::new("Sage", "herb", date(2024, 7, 1)),
        )
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(
        service.get(created.plant.uuid).unwrap().unwrap().plant.planted_on,
        today()
    );
}

#[test]
fn delete_unknown_plant_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service.delete(Uuid::new_v4()).unwrap_err();
    assert!(err.is_not_found());

    let created = service
        .create(PlantInput::new("Chives", "herb", today()))
        .unwrap();
    service.delete(created.plant.uuid).unwrap();
    assert!(service.get(created.plant.uuid).unwrap().is_none());
}

#[test]
fn text_filters_ignore_case() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut tomato = PlantInput::new("Cherry Tomato", "Vegetable", date(2024, 6, 1));
    tomato.region = Some("South".to_string());
    service.create(tomato).unwrap();
    let mut pepper = PlantInput::new("Pepper", "vegetable", date(2024, 6, 2));
    pepper.region = Some("north".to_string());
    service.create(pepper).unwrap();
    let mut mint = PlantInput::new("Mint", "herb", date(2024, 6, 3));
    mint.region = Some("SOUTH".to_string());
    service.create(mint).unwrap();

    let names = |records: Vec<garden_core::PlantRecord>| -> Vec<String> {
        records.into_iter().map(|record| record.plant.name).collect()
    };

    assert_eq!(
        names(service.find_by_name_contains("TOMATO").unwrap()),
        vec!["Cherry Tomato"]
    );
    assert_eq!(
        names(service.find_by_type("VEGETABLE").unwrap()),
        vec!["Pepper", "Cherry Tomato"]
    );
    assert_eq!(
        names(service.find_by_region("south").unwrap()),
        vec!["Mint", "Cherry Tomato"]
    );
    assert_eq!(
        names(service.find_by_type_and_region("vegetable", "South").unwrap()),
        vec!["Cherry Tomato"]
    );
    assert_eq!(
        names(service.suggest_for_region("North").unwrap()),
        vec!["Pepper"]
    );
    assert!(service.exists_by_name("mint").unwrap());
    assert!(!service.exists_by_name("min").unwrap());
}

#[test]
fn name_search_treats_wildcards_literally() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    service
        .create(PlantInput::new("Bed_1 lettuce", "vegetable", today()))
        .unwrap();
    service
        .create(PlantInput::new("Bed 1 kale", "vegetable", today()))
        .unwrap();

    let found = service.find_by_name_contains("_1").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].plant.name, "Bed_1 lettuce");
    assert_eq!(service.find_by_name_contains("%").unwrap().len(), 0);
}

#[test]
fn planted_within_last_days_includes_boundary() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    service
        .create(PlantInput::new("Inside", "herb", date(2024, 6, 8)))
        .unwrap();
    service
        .create(PlantInput::new("Outside", "herb", date(2024, 6, 7)))
        .unwrap();

    let recent = service.find_planted_within_last_days(7).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].plant.name, "Inside");
    assert_eq!(service.find_planted_within_last_days(0).unwrap().len(), 0);
}

#[test]
fn list_all_orders_newest_planting_first() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    service
        .create(PlantInput::new("beta", "herb", date(2024, 6, 1)))
        .unwrap();
    service
        .create(PlantInput::new("Alpha", "herb", date(2024, 6, 1)))
        .unwrap();
    service
        .create(PlantInput::new("Gamma", "herb", date(2024, 6, 10)))
        .unwrap();

    let names: Vec<_> = service
        .list_all()
        .unwrap()
        .into_iter()
        .map(|record| record.plant.name)
        .collect();
    assert_eq!(names, vec!["Gamma", "Alpha", "beta"]);
}

#[test]
fn stats_by_type_orders_by_count() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    for (name, plant_type) in [
        ("Basil", "herb"),
        ("Mint", "herb"),
        ("Kale", "vegetable"),
        ("Rose", "flower"),
        ("Sage", "herb"),
    ] {
        service
            .create(PlantInput::new(name, plant_type, today()))
            .unwrap();
    }

    assert_eq!(
        service.stats_by_type().unwrap(),
        vec![
            TypeCount {
                plant_type: "herb".to_string(),
                count: 3
            },
            TypeCount {
                plant_type: "flower".to_string(),
                count: 1
            },
            TypeCount {
                plant_type: "vegetable".to_string(),
                count: 1
            },
        ]
    );
}

#[test]
fn stats_by_type_merges_case_variants_like_find_by_type() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    for (name, plant_type) in [("Kale", "vegetable"), ("Leek", "Vegetable"), ("Rose", "flower")] {
        service
            .create(PlantInput::new(name, plant_type, today()))
            .unwrap();
    }

    assert_eq!(service.find_by_type("VEGETABLE").unwrap().len(), 2);
    assert_eq!(
        service.stats_by_type().unwrap(),
        vec![
            TypeCount {
                plant_type: "Vegetable".to_string(),
                count: 2
            },
            TypeCount {
                plant_type: "flower".to_string(),
                count: 1
            },
        ]
    );
}

#[test]
fn plant_record_serializes_flat() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut input = PlantInput::new("Squash", "vegetable", date(2024, 6, 1));
    input.cycle_days = Some(50);
    let created = service.create(input).unwrap();

    let value = serde_json::to_value(&created).unwrap();
    assert_eq!(value["name"], "Squash");
    assert_eq!(value["type"], "vegetable");
    assert_eq!(value["planted_on"], "2024-06-01");
    assert_eq!(value["harvest_date"], "2024-07-21");
    assert_eq!(value["due_for_watering"], true);
    assert_eq!(value["total_care"], 0);
}
