//! Integration tests for CI registration, lookup, update and deletion.

use constellation::domain::{
    CiFilter, CiId, CiType, CiUpdate, Criticality, Environment, NewCi, RelationshipType,
    RiskAssessment,
};
use constellation::error::{Error, ValidationError};
use rstest::rstest;
use serde_json::json;

mod common;
use common::{app, create_ci, create_typed_ci, link};

#[tokio::test]
async fn create_then_get_round_trips_every_field() {
    let app = app().await;
    let mut new = NewCi::new("payments-db")
        .with_type(CiType::Database)
        .with_criticality(Criticality::Critical);
    new.hostname = Some("db01.internal".to_string());
    new.compliance_tags = vec!["pci".to_string()];
    new.custom_attributes.insert("engine".to_string(), json!("postgres"));

    let created = app.assets().create(new).await.unwrap();
    let fetched = app.assets().get(&created.id).await.unwrap().unwrap();

    assert_eq!(fetched, created);
    assert_eq!(fetched.environment, Environment::Prod);
    assert_eq!(fetched.custom_attributes["engine"], json!("postgres"));
    assert_eq!(fetched.created_at, fetched.updated_at);
}

#[tokio::test]
async fn get_unknown_returns_none() {
    let app = app().await;
    assert!(app.assets().get(&CiId::new("nope")).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_id_is_a_constraint_violation() {
    let app = app().await;
    create_ci(&app, "a", Criticality::Low).await;
    let mut again = NewCi::new("other");
    again.id = Some(CiId::new("a"));
    let err = app.assets().create(again).await.unwrap_err();
    assert!(matches!(err, Error::ConstraintViolation(_)));
}

#[rstest]
#[case::empty_name("", "name")]
#[case::whitespace_name("   ", "name")]
#[tokio::test]
async fn invalid_names_are_rejected(#[case] name: &str, #[case] field: &str) {
    let app = app().await;
    let err = app.assets().create(NewCi::new(name)).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::Empty { field: f }) if f == field
    ));
}

#[tokio::test]
async fn description_limit_is_enforced() {
    let app = app().await;
    let mut new = NewCi::new("svc");
    new.description = Some("d".repeat(1001));
    assert!(app.assets().create(new).await.is_err());

    let mut new = NewCi::new("svc");
    new.description = Some("d".repeat(1000));
    assert!(app.assets().create(new).await.is_ok());
}

#[tokio::test]
async fn delete_is_idempotent_and_removes_relationships() {
    let app = app().await;
    create_ci(&app, "a", Criticality::Low).await;
    create_ci(&app, "b", Criticality::Low).await;
    link(&app, "a", "b", RelationshipType::DependsOn).await;

    assert!(app.assets().delete(&CiId::new("b")).await.unwrap());
    assert!(!app.assets().delete(&CiId::new("b")).await.unwrap());

    let stats = app.relationships().graph_stats().await.unwrap();
    assert_eq!(stats.total_cis, 1);
    assert_eq!(stats.total_relationships, 0);
}

#[tokio::test]
async fn list_filters_are_conjunctive() {
    let app = app().await;
    create_typed_ci(&app, "low-server", CiType::Server, Criticality::Low).await;
    create_typed_ci(&app, "high-server", CiType::Server, Criticality::High).await;
    create_typed_ci(&app, "high-db", CiType::Database, Criticality::High).await;

    let filter = CiFilter {
        criticality: Some(Criticality::High),
        ..Default::default()
    };
    let page = app.assets().list(filter, 100, 0).await.unwrap();
    assert_eq!(page.total_count, 2);

    let filter = CiFilter {
        ci_type: Some(CiType::Server),
        criticality: Some(Criticality::High),
        ..Default::default()
    };
    let page = app.assets().list(filter, 100, 0).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "high-server");
}

#[tokio::test]
async fn list_pages_by_name() {
    let app = app().await;
    for id in ["c", "a", "e", "b", "d"] {
        create_ci(&app, id, Criticality::Medium).await;
    }
    let page = app.assets().list(CiFilter::default(), 2, 1).await.unwrap();
    let names: Vec<_> = page.items.iter().map(|ci| ci.name.as_str()).collect();
    assert_eq!(names, vec!["b", "c"]);
    assert_eq!(page.total_count, 5);
    assert_eq!((page.limit, page.offset), (2, 1));
}

#[rstest]
#[case::zero(0)]
#[case::too_large(1001)]
#[tokio::test]
async fn list_limit_out_of_range(#[case] limit: usize) {
    let app = app().await;
    let err = app
        .assets()
        .list(CiFilter::default(), limit, 0)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::LimitOutOfRange { .. })
    ));
}

#[tokio::test]
async fn update_changes_only_given_fields() {
    let app = app().await;
    let original = create_ci(&app, "svc", Criticality::Low).await;

    let updated = app
        .assets()
        .update_json(&original.id, &json!({"criticality": "HIGH", "owner": "ops"}))
        .await
        .unwrap();

    assert_eq!(updated.criticality, Criticality::High);
    assert_eq!(updated.owner.as_deref(), Some("ops"));
    assert_eq!(updated.name, original.name);
    assert_eq!(updated.created_at, original.created_at);
    assert!(updated.updated_at >= original.updated_at);
}

#[rstest]
#[case::immutable_id(json!({"id": "x"}))]
#[case::immutable_created(json!({"created_at": "2024-01-01T00:00:00Z"}))]
#[case::unknown(json!({"colour": "red"}))]
#[case::empty(json!({}))]
#[case::not_object(json!(["owner"]))]
#[case::bad_enum(json!({"criticality": "URGENT"}))]
#[case::likelihood_above_five(json!({"risk_assessment": {"likelihood": 6, "impact": 3}}))]
#[case::impact_below_one(json!({"risk_assessment": {"likelihood": 2, "impact": 0}}))]
#[tokio::test]
async fn invalid_updates_are_rejected(#[case] payload: serde_json::Value) {
    let app = app().await;
    let ci = create_ci(&app, "svc", Criticality::Low).await;
    let err = app.assets().update_json(&ci.id, &payload).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "got {err:?}");

    let unchanged = app.assets().get(&ci.id).await.unwrap().unwrap();
    assert_eq!(unchanged, ci);
}

#[tokio::test]
async fn risk_assessment_is_stored_and_validated_on_create() {
    let app = app().await;
    let mut new = NewCi::new("ledger");
    new.risk_assessment = Some(RiskAssessment {
        residual_likelihood: Some(1),
        residual_impact: Some(2),
        ..RiskAssessment::new(4, 5)
    });
    let ci = app.assets().create(new.clone()).await.unwrap();
    let stored = app.assets().get(&ci.id).await.unwrap().unwrap();
    let risk = stored.risk_assessment.unwrap();
    assert_eq!(risk.score(), 20);
    assert_eq!(risk.residual_score(), Some(2));

    new.id = None;
    new.risk_assessment = Some(RiskAssessment::new(0, 5));
    let err = app.assets().create(new).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::ScoreOutOfRange {
            field: "likelihood",
            ..
        })
    ));
}

#[tokio::test]
async fn update_unknown_ci_is_not_found() {
    let app = app().await;
    let update = CiUpdate {
        owner: Some(Some("ops".to_string())),
        ..Default::default()
    };
    let err = app
        .assets()
        .update(&CiId::new("ghost"), update)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CiNotFound(id) if id.as_str() == "ghost"));
}

#[tokio::test]
async fn search_matches_substrings_case_insensitively() {
    let app = app().await;
    let mut new = NewCi::new("Billing API");
    new.hostname = Some("billing01.example.com".to_string());
    app.assets().create(new).await.unwrap();
    app.assets().create(NewCi::new("auth-service")).await.unwrap();

    let hits = app.assets().search("BILLING", 20).await.unwrap();
    assert_eq!(hits.len(), 1);

    let hits = app.assets().search("example.com", 20).await.unwrap();
    assert_eq!(hits.len(), 1);

    assert!(app.assets().search("   ", 20).await.is_err());
    assert!(app.assets().search("billing", 101).await.is_err());
}

#[tokio::test]
async fn count_tracks_creates_and_deletes() {
    let app = app().await;
    assert_eq!(app.assets().count().await.unwrap(), 0);
    create_ci(&app, "a", Criticality::Low).await;
    create_ci(&app, "b", Criticality::Low).await;
    app.assets().delete(&CiId::new("a")).await.unwrap();
    assert_eq!(app.assets().count().await.unwrap(), 1);
}
