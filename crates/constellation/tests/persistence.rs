//! Integration tests for JSONL-backed repositories.

use constellation::app::App;
use constellation::commands::init::init;
use constellation::config::BackendKind;
use constellation::domain::{CiId, Criticality, Direction, NewCi, RelationshipType};
use constellation::store::{GraphStore, MemoryGraphStore};
use std::sync::Arc;
use tempfile::TempDir;

fn ci_line(id: &str, name: &str) -> String {
    format!(
        r#"{{"kind":"ci","id":"{id}","name":"{name}","ci_type":"SERVICE","criticality":"HIGH","created_at":"2024-01-01T00:00:00Z","updated_at":"2024-01-01T00:00:00Z"}}"#
    )
}

fn relationship_line(id: &str, source: &str, target: &str) -> String {
    format!(
        r#"{{"kind":"relationship","id":"{id}","source_id":"{source}","target_id":"{target}","relationship_type":"DEPENDS_ON","created_at":"2024-01-01T00:00:00Z","updated_at":"2024-01-01T00:00:00Z"}}"#
    )
}

#[tokio::test]
async fn data_survives_reopening_the_repository() {
    let temp = TempDir::new().unwrap();
    init(temp.path(), BackendKind::Jsonl).await.unwrap();

    let app = App::from_directory(temp.path()).await.unwrap();
    let mut db = NewCi::new("orders-db").with_criticality(Criticality::Critical);
    db.id = Some(CiId::new("db"));
    app.assets().create(db).await.unwrap();
    let mut api = NewCi::new("orders-api");
    api.id = Some(CiId::new("api"));
    app.assets().create(api).await.unwrap();
    app.relationships()
        .create(
            &CiId::new("api"),
            &CiId::new("db"),
            RelationshipType::DependsOn,
            None,
        )
        .await
        .unwrap();
    app.close().await.unwrap();

    let reopened = App::from_directory(temp.path()).await.unwrap();
    let db = reopened.assets().get(&CiId::new("db")).await.unwrap().unwrap();
    assert_eq!(db.name, "orders-db");
    assert_eq!(db.criticality, Criticality::Critical);

    let impact = reopened
        .analysis()
        .impact_analysis(&CiId::new("db"), None)
        .await
        .unwrap();
    assert_eq!(impact.total_impacted, 1);
    reopened.close().await.unwrap();
}

#[tokio::test]
async fn memory_backend_forgets_on_reopen() {
    let temp = TempDir::new().unwrap();
    init(temp.path(), BackendKind::Memory).await.unwrap();

    let app = App::from_directory(temp.path()).await.unwrap();
    app.assets().create(NewCi::new("scratch")).await.unwrap();
    app.close().await.unwrap();

    let reopened = App::from_directory(temp.path()).await.unwrap();
    assert_eq!(reopened.assets().count().await.unwrap(), 0);
}

#[tokio::test]
async fn damaged_snapshot_lines_are_skipped() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("graph.jsonl");
    let contents = [
        ci_line("a", "alpha"),
        "{ this is not json".to_string(),
        ci_line("b", "beta"),
        ci_line("a", "alpha again"),
        relationship_line("r1", "b", "a"),
        relationship_line("r2", "b", "ghost"),
        String::new(),
    ]
    .join("\n");
    tokio::fs::write(&path, contents).await.unwrap();

    let store: Arc<dyn GraphStore> = Arc::new(MemoryGraphStore::with_snapshot(&path));
    store.connect().await.unwrap();
    let app = App::new(store);

    assert_eq!(app.assets().count().await.unwrap(), 2);
    let a = app.assets().get(&CiId::new("a")).await.unwrap().unwrap();
    assert_eq!(a.name, "alpha");

    let links = app
        .relationships()
        .list_for(&CiId::new("b"), Direction::Outgoing)
        .await
        .unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].related_id.as_str(), "a");
}

#[tokio::test]
async fn writes_rewrite_the_snapshot_atomically() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("graph.jsonl");

    let store = MemoryGraphStore::with_snapshot(&path);
    store.connect().await.unwrap();
    let app = App::new(Arc::new(store));
    let ci = app.assets().create(NewCi::new("svc")).await.unwrap();

    let text = tokio::fs::read_to_string(&path).await.unwrap();
    assert_eq!(text.lines().count(), 1);
    assert!(text.contains(r#""kind":"ci""#));
    assert!(text.contains(ci.id.as_str()));
    assert!(!temp.path().join("nested").join("graph.jsonl.tmp").exists());

    app.assets().delete(&ci.id).await.unwrap();
    let text = tokio::fs::read_to_string(&path).await.unwrap();
    assert!(text.trim().is_empty());
}

#[tokio::test]
async fn uninitialized_directory_is_reported() {
    let temp = TempDir::new().unwrap();
    let err = App::from_directory(temp.path()).await.unwrap_err();
    assert!(err.to_string().contains("Not a constellation repository"));
}
