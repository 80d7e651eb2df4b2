use super::init::migrate;
use super::Database;
use crate::error::MeetError;
use rusqlite::Connection;

#[test]
fn test_migrate_creates_tables() {
    let conn = Connection::open_in_memory().unwrap();
    migrate(&conn).unwrap();

    for table in ["users", "meetings", "meeting_photos"] {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [table],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1, "table {table} missing");
    }
}

#[test]
fn test_migrate_is_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    migrate(&conn).unwrap();
    migrate(&conn).unwrap();
}

#[test]
fn test_duration_must_be_positive() {
    let conn = Connection::open_in_memory().unwrap();
    migrate(&conn).unwrap();
    conn.execute(
        "INSERT INTO users (username, email, password_hash, created_at) \
         VALUES ('u', 'u@example.com', 'x', '2026-01-01 00:00:00')",
        [],
    )
    .unwrap();

    let result = conn.execute(
        "INSERT INTO meetings (uid, title, location, start_time, duration_minutes, created_by, \
         created_at, updated_at) VALUES ('a', 't', 'l', '2026-01-01 00:00:00', 0, 1, \
         '2026-01-01 00:00:00', '2026-01-01 00:00:00')",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn test_open_creates_parent_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("meetdesk.db");

    let db = Database::open(&path).unwrap();
    assert!(path.exists());
    assert_eq!(db.path(), path.as_path());

    let fk: i64 = db
        .connect()
        .unwrap()
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .unwrap();
    assert_eq!(fk, 1);
}

#[tokio::test]
async fn test_run_propagates_closure_errors() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("meetdesk.db")).unwrap();

    let count = db
        .run(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM meetings", [], |row| row.get(0))?;
            Ok(n)
        })
        .await
        .unwrap();
    assert_eq!(count, 0);

    let err = db
        .run(|_| -> Result<(), MeetError> { Err(MeetError::NotFound("Meeting")) })
        .await
        .unwrap_err();
    assert!(matches!(err, MeetError::NotFound("Meeting")));
}
