use std::fs;

use ada_core::open_db_in_memory;
use ada_server::{seed_store, StartupError};

#[test]
fn seed_inserts_once_into_empty_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    fs::write(
        &path,
        r#"[
            {"name": "Umbrella", "price": 10, "stock": 3},
            {"name": "Thank-you card", "info": "hand written", "price": 2}
        ]"#,
    )
    .unwrap();

    let conn = open_db_in_memory().unwrap();
    assert_eq!(seed_store(&conn, &path).unwrap(), 2);
    assert_eq!(seed_store(&conn, &path).unwrap(), 0);
}

#[test]
fn seed_reports_unreadable_and_malformed_files() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db_in_memory().unwrap();

    let missing = dir.path().join("missing.json");
    assert!(matches!(
        seed_store(&conn, &missing),
        Err(StartupError::SeedRead { .. })
    ));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "[{\"name\": ").unwrap();
    assert!(matches!(
        seed_store(&conn, &broken),
        Err(StartupError::SeedParse { .. })
    ));
}
