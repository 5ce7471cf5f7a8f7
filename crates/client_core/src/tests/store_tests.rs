use super::*;

#[tokio::test]
async fn memory_store_sets_and_removes() {
    let store = MemoryStore::new();
    store.set("token", "abc").await.expect("set");
    assert_eq!(store.get("token").await.expect("get").as_deref(), Some("abc"));
    store.remove("token").await.expect("remove");
    store.remove("token").await.expect("remove twice");
    assert_eq!(store.get("token").await.expect("get"), None);
}

#[tokio::test]
async fn file_store_persists_across_instances() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = FileStore::scoped(dir.path().join("nested"), "session");
    first.set("token", "abc").await.expect("set");
    first.set("username", "alice").await.expect("set");

    let second = FileStore::scoped(dir.path().join("nested"), "session");
    assert_eq!(second.get("token").await.expect("get").as_deref(), Some("abc"));
    assert_eq!(
        second.get("username").await.expect("get").as_deref(),
        Some("alice")
    );

    let other_scope = FileStore::scoped(dir.path().join("nested"), "other");
    assert_eq!(other_scope.get("token").await.expect("get"), None);
}

#[tokio::test]
async fn file_store_reports_corrupt_contents() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStore::scoped(dir.path(), "session");
    std::fs::write(store.path(), b"{not json").expect("write");

    let err = store.get("token").await.expect_err("corrupt");
    assert!(matches!(err, StoreError::Corrupt(_)));
}
