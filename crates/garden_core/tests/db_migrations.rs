use garden_core::db::migrations::latest_version;
use garden_core::db::{open_db, open_db_in_memory, DbError};
use garden_core::{RepoError, SqliteCareRepository, SqlitePlantRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "plants");
    assert_table_exists(&conn, "care_events");
}

#[test]
fn plants_table_has_only_mapped_columns() {
    let conn = open_db_in_memory().unwrap();
    let mut stmt = conn.prepare("PRAGMA table_info(plants);").unwrap();
    let columns: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>("name"))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(
        columns,
        [
            "uuid",
            "name",
            "plant_type",
            "planted_on",
            "cycle_days",
            "region",
            "description",
            "watering_interval_days",
            "pruning_interval_days",
        ]
    );
}

#[test]
fn connections_enforce_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let orphan = conn.execute(
        "INSERT INTO care_events (uuid, plant_uuid, performed_on, kind, created_at)
         VALUES ('c1', 'missing-plant', '2024-01-01', 'watering', 0);",
        [],
    );
    assert!(orphan.is_err());
}

#[test]
fn schema_rejects_unknown_care_kind() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO plants (uuid, name, plant_type, planted_on) VALUES ('p1', 'Basil', 'herb', '2024-01-01');",
        [],
    )
    .unwrap();

    let result = conn.execute(
        "INSERT INTO care_events (uuid, plant_uuid, performed_on, kind, created_at)
         VALUES ('c1', 'p1', '2024-01-02', 'weeding', 0);",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garden.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "care_events");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn failed_migration_step_is_named_and_rolled_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clash.sqlite3");

    // A stray table without the columns the care indexes need.
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE care_events (id INTEGER);")
        .unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::Migration { version, name, .. } => {
            assert_eq!(version, 2);
            assert_eq!(name, "care_events");
        }
        other => panic!("unexpected error: {other}"),
    }

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 0);
    let plants: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'plants';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(plants, 0);
}

#[test]
fn repositories_refuse_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();

    assert!(matches!(
        SqlitePlantRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("plants"))
    ));
    assert!(matches!(
        SqliteCareRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("plants"))
    ));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
