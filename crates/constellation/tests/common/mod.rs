//! Shared helpers for integration tests.

#![allow(dead_code)]

use constellation::app::App;
use constellation::domain::{
    Ci, CiId, CiType, Criticality, NewCi, Relationship, RelationshipType,
};

/// A connected in-memory application.
pub async fn app() -> App {
    App::in_memory().await.expect("in-memory app")
}

/// Create a CI with a fixed id, name and criticality.
pub async fn create_ci(app: &App, id: &str, criticality: Criticality) -> Ci {
    create_typed_ci(app, id, CiType::Service, criticality).await
}

/// Create a CI with a fixed id, type and criticality. The name equals the id.
pub async fn create_typed_ci(app: &App, id: &str, ci_type: CiType, criticality: Criticality) -> Ci {
    let mut new = NewCi::new(id)
        .with_type(ci_type)
        .with_criticality(criticality);
    new.id = Some(CiId::new(id));
    app.assets().create(new).await.expect("create CI")
}

/// Create `source -[kind]-> target` with default properties.
pub async fn link(app: &App, source: &str, target: &str, kind: RelationshipType) -> Relationship {
    app.relationships()
        .create(&CiId::new(source), &CiId::new(target), kind, None)
        .await
        .expect("create relationship")
}
