use super::*;

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn missing_snapshot_reads_as_none() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let snapshot = storage.get_snapshot("itemsStore").await.expect("read");
    assert!(snapshot.is_none());
}

#[tokio::test]
async fn put_snapshot_overwrites_previous_value() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .put_snapshot("itemsStore", r#"{"selectedIds":[1]}"#)
        .await
        .expect("first write");
    storage
        .put_snapshot("itemsStore", r#"{"selectedIds":[2,1]}"#)
        .await
        .expect("second write");

    let snapshot = storage
        .get_snapshot("itemsStore")
        .await
        .expect("read")
        .expect("row");
    assert_eq!(snapshot.value, r#"{"selectedIds":[2,1]}"#);
    assert_eq!(
        storage.list_snapshot_keys().await.expect("keys"),
        vec!["itemsStore".to_string()]
    );
}

#[tokio::test]
async fn delete_snapshot_reports_whether_row_existed() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.put_snapshot("a", "1").await.expect("write");

    assert!(storage.delete_snapshot("a").await.expect("delete"));
    assert!(!storage.delete_snapshot("a").await.expect("delete again"));
    assert!(storage.get_snapshot("a").await.expect("read").is_none());
}

#[test]
fn sqlite_path_ignores_memory_and_foreign_urls() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(sqlite_path("postgres://localhost/db"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/cache.db?mode=rwc"),
        Some(PathBuf::from("./data/cache.db"))
    );
}
