//! Integration tests for the appkit-store crate.
//!
//! These run the component store against a real SQLite database on disk
//! (via tempfile), including reopening the database between operations.

use appkit_store::{
    Component, ComponentRef, ComponentStore, Database, MetadataStore, SqliteMetadataStore,
    COMPONENTS_META_KEY,
};
use serde_json::json;

async fn open_store(path: std::path::PathBuf) -> ComponentStore<SqliteMetadataStore> {
    let db = Database::open_and_migrate(path).await.unwrap();
    ComponentStore::new(SqliteMetadataStore::new(db))
}

// ═══════════════════════════════════════════════════════════════════════
//  Database lifecycle
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn database_open_and_migrate_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");

    let db = Database::open_and_migrate(db_path.clone()).await.unwrap();
    let count: i64 = db
        .execute(|conn| {
            let c: i64 = conn.query_row("SELECT count(*) FROM app_meta", [], |row| row.get(0))?;
            Ok(c)
        })
        .await
        .unwrap();
    assert_eq!(count, 0);
    assert!(db_path.exists());
}

#[tokio::test]
async fn database_open_and_migrate_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("idempotent.db");

    let db1 = Database::open_and_migrate(db_path.clone()).await.unwrap();
    drop(db1);
    Database::open_and_migrate(db_path).await.unwrap();
}

// ═══════════════════════════════════════════════════════════════════════
//  Components lifecycle
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn components_full_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path().join("test.db")).await;
    let app = 7;

    assert_eq!(store.count(app).await.unwrap(), 0);

    // Create.
    let home = Component::new("home", "page").with_label("Home");
    let news = Component::new("news", "posts-list")
        .with_label("News")
        .with_option("taxonomy", json!("category"));
    assert_eq!(store.upsert(app, home.clone(), None).await.unwrap(), Some(1));
    assert_eq!(store.upsert(app, news.clone(), None).await.unwrap(), Some(2));

    // Look up.
    assert_eq!(store.find_by_slug(app, "news").await.unwrap(), Some(news.clone()));
    assert_eq!(store.find_by_id(app, 2).await.unwrap(), Some(news.clone()));
    assert_eq!(
        store
            .exists(app, &ComponentRef::from("home"), Some(1))
            .await
            .unwrap(),
        None
    );
    assert_eq!(
        store
            .exists(app, &ComponentRef::from("home"), Some(2))
            .await
            .unwrap(),
        Some(1)
    );
    assert_eq!(store.component_id(app, &news).await.unwrap(), Some(2));

    // Update.
    let renamed = Component::new("latest", "posts-list").with_label("Latest");
    assert_eq!(
        store.upsert(app, renamed.clone(), Some(2)).await.unwrap(),
        Some(2)
    );
    assert_eq!(store.find_by_id(app, 2).await.unwrap(), Some(renamed));

    // Delete.
    assert!(store.delete(app, 1).await.unwrap());
    assert!(!store.delete(app, 1).await.unwrap());
    assert!(store.find_by_id(app, 1).await.unwrap().is_none());
    assert_eq!(store.count(app).await.unwrap(), 1);

    // Next id follows the remaining maximum.
    assert_eq!(
        store
            .upsert(app, Component::new("about", "page"), None)
            .await
            .unwrap(),
        Some(3)
    );
}

#[tokio::test]
async fn components_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reopen.db");

    {
        let store = open_store(path.clone()).await;
        store
            .upsert(1, Component::new("home", "page"), None)
            .await
            .unwrap();
        store
            .upsert(2, Component::new("shop", "addon-store"), None)
            .await
            .unwrap();
    }

    let store = open_store(path).await;
    assert_eq!(store.count(1).await.unwrap(), 1);
    assert_eq!(store.apps().await.unwrap(), vec![1, 2]);
    let shop = store.find_by_slug(2, "shop").await.unwrap().unwrap();
    assert_eq!(shop.kind, "addon-store");
}

#[tokio::test]
async fn collection_is_stored_as_one_value() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path().join("shape.db")).await;

    store
        .upsert(3, Component::new("home", "page"), None)
        .await
        .unwrap();
    store
        .upsert(3, Component::new("news", "posts-list"), None)
        .await
        .unwrap();

    let raw = store
        .metadata()
        .get(3, COMPONENTS_META_KEY)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(raw["1"]["slug"], json!("home"));
    assert_eq!(raw["2"]["type"], json!("posts-list"));
    assert_eq!(raw.as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn emptied_collection_stays_stored() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path().join("empty.db")).await;

    store
        .upsert(9, Component::new("home", "page"), None)
        .await
        .unwrap();
    assert!(store.delete(9, 1).await.unwrap());

    assert_eq!(
        store.metadata().get(9, COMPONENTS_META_KEY).await.unwrap(),
        Some(json!({}))
    );
    assert_eq!(store.count(9).await.unwrap(), 0);
}

#[tokio::test]
async fn dangling_components_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path().join("dangling.db")).await;

    store
        .upsert(4, Component::new("home", "page"), None)
        .await
        .unwrap();
    store
        .upsert(4, Component::new("shop", "addon-store"), None)
        .await
        .unwrap();

    let dangling = store.dangling(4, |kind| kind == "page").await.unwrap();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].0, 2);
    assert_eq!(
        store
            .exists(4, &ComponentRef::from("shop"), None)
            .await
            .unwrap(),
        Some(2)
    );
}

#[tokio::test]
async fn read_only_handle_counts_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("appkit.db");

    let store = open_store(db_path.clone()).await;
    store
        .upsert(4, Component::new("home", "page"), None)
        .await
        .unwrap();
    drop(store);

    let db = Database::open_read_only(&db_path).unwrap();
    assert_eq!(
        db.schema_version().await.unwrap(),
        appkit_store::migration::latest_version()
    );
    let reader = ComponentStore::new(SqliteMetadataStore::new(db));
    assert_eq!(reader.apps().await.unwrap(), vec![4]);
    assert_eq!(reader.count(4).await.unwrap(), 1);
    assert!(
        reader
            .upsert(4, Component::new("news", "posts-list"), None)
            .await
            .is_err()
    );
}
