//! Integration tests for the HTTP API.
//!
//! Runs the real router against an in-memory registry with a frozen clock
//! (2025-01-01).

#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use roster::api::dto::{CutoffList, HealthResponse, PersonDto};
use roster::api::{AppState, Clock, create_router, with_rate_limit};
use roster_core::Registry;
use serde_json::{Value, json};
use std::num::NonZeroU32;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn frozen_clock() -> Clock {
    Clock::Fixed(DateTime::<Utc>::from_timestamp(1_735_732_800, 0).unwrap())
}

fn server() -> TestServer {
    let state = AppState::new(Registry::in_memory(), frozen_clock());
    TestServer::new(create_router(state)).unwrap()
}

fn seeded_server() -> TestServer {
    let mut registry = Registry::in_memory();
    registry.seed(frozen_clock().now()).unwrap();
    let state = AppState::new(registry, frozen_clock());
    TestServer::new(create_router(state)).unwrap()
}

fn ana() -> Value {
    json!({
        "given_name": " ana ",
        "family_name": "silva",
        "birth_date": "03/09/1999",
        "sex": "F",
        "national_id": "165.596.877-75"
    })
}

async fn create_ana(server: &TestServer) -> PersonDto {
    let response = server.post("/people").json(&ana()).await;
    response.assert_status(StatusCode::CREATED);
    response.json::<PersonDto>()
}

// =============================================================================
// HEALTH
// =============================================================================

#[tokio::test]
async fn test_health() {
    let server = server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    let health = response.json::<HealthResponse>();
    assert_eq!(health.status, "ok");
    assert_eq!(health.people, 0);
}

// =============================================================================
// PEOPLE
// =============================================================================

#[tokio::test]
async fn test_create_normalizes_and_derives() {
    let server = server();
    let ana = create_ana(&server).await;

    assert_eq!(ana.given_name, "Ana");
    assert_eq!(ana.family_name, "Silva");
    assert_eq!(ana.national_id, "16559687775");
    assert_eq!(ana.national_id_formatted, "165.596.877-75");
    assert_eq!(ana.age, 25);
    assert_eq!(ana.age_bracket, "18-29");
    assert_eq!(ana.sex_label, "Female");

    let women = server.get("/filters/sex/F").await.json::<Vec<PersonDto>>();
    assert_eq!(women, vec![ana]);
}

#[tokio::test]
async fn test_create_reports_every_invalid_field() {
    let server = server();
    let response = server
        .post("/people")
        .json(&json!({
            "given_name": "  ",
            "family_name": "silva",
            "birth_date": "1999/09/03",
            "sex": "F",
            "national_id": "123"
        }))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.json::<Value>();
    let fields = body["fields"].as_object().unwrap();
    assert!(fields.contains_key("given_name"));
    assert!(fields.contains_key("birth_date"));
    assert!(fields.contains_key("national_id"));
    assert_eq!(fields.len(), 3);
}

#[tokio::test]
async fn test_create_duplicate_is_conflict() {
    let server = server();
    create_ana(&server).await;

    let response = server.post("/people").json(&ana()).expect_failure().await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_get_and_delete() {
    let server = server();
    let ana = create_ana(&server).await;
    let path = format!("/people/{}", ana.id);

    server.get(&path).await.assert_status_ok();
    server.delete(&path).await.assert_status_ok();

    server
        .get(&path)
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .delete(&path)
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_lookup_by_national_id() {
    let server = server();
    let ana = create_ana(&server).await;

    let found = server
        .get("/people/by-national-id/165.596.877-75")
        .await
        .json::<PersonDto>();
    assert_eq!(found.id, ana.id);

    server
        .get("/people/by-national-id/99999999999")
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get("/people/by-national-id/123")
        .expect_failure()
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_search() {
    let server = seeded_server();

    let timons = server
        .get("/people")
        .add_query_param("q", "TIMON")
        .await
        .json::<Vec<PersonDto>>();
    assert_eq!(timons.len(), 3);

    let by_id = server
        .get("/people")
        .add_query_param("q", "16559687775")
        .await
        .json::<Vec<PersonDto>>();
    assert_eq!(by_id.len(), 1);
    assert_eq!(by_id[0].given_name, "Gabriel");

    let everyone = server.get("/people").await.json::<Vec<PersonDto>>();
    assert_eq!(everyone.len(), 26);
}

// =============================================================================
// SINGLE-FIELD UPDATES
// =============================================================================

#[tokio::test]
async fn test_update_each_field() {
    let server = server();
    let ana = create_ana(&server).await;
    let base = format!("/people/{}", ana.id);

    let updated = server
        .put(&format!("{base}/given-name"))
        .json(&json!({ "value": "maria clara" }))
        .await
        .json::<PersonDto>();
    assert_eq!(updated.given_name, "Maria Clara");
    assert_eq!(updated.family_name, "Silva");

    let updated = server
        .put(&format!("{base}/family-name"))
        .json(&json!({ "value": "souza" }))
        .await
        .json::<PersonDto>();
    assert_eq!(updated.family_name, "Souza");

    let updated = server
        .put(&format!("{base}/birth-date"))
        .json(&json!({ "value": "2010-06-15" }))
        .await
        .json::<PersonDto>();
    assert_eq!(updated.age, 14);
    assert_eq!(updated.age_bracket, "0-17");

    let updated = server
        .put(&format!("{base}/sex"))
        .json(&json!({ "value": "m" }))
        .await
        .json::<PersonDto>();
    assert_eq!(updated.sex_label, "Male");

    let updated = server
        .put(&format!("{base}/national-id"))
        .json(&json!({ "value": "111.111.111-11" }))
        .await
        .json::<PersonDto>();
    assert_eq!(updated.national_id, "11111111111");
}

#[tokio::test]
async fn test_update_rejects_invalid_value() {
    let server = server();
    let ana = create_ana(&server).await;

    let response = server
        .put(&format!("/people/{}/birth-date", ana.id))
        .json(&json!({ "value": "yesterday" }))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.json::<Value>();
    assert!(body["fields"]["birth_date"].is_string());

    let unchanged = server.get(&format!("/people/{}", ana.id)).await.json::<PersonDto>();
    assert_eq!(unchanged, ana);
}

#[tokio::test]
async fn test_update_national_id_conflict() {
    let server = server();
    create_ana(&server).await;
    let bia = server
        .post("/people")
        .json(&json!({
            "given_name": "bia",
            "family_name": "souza",
            "birth_date": "1990-01-01",
            "sex": "F",
            "national_id": "22222222222"
        }))
        .await
        .json::<PersonDto>();

    server
        .put(&format!("/people/{}/national-id", bia.id))
        .json(&json!({ "value": "16559687775" }))
        .expect_failure()
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_update_unknown_person() {
    let server = server();
    server
        .put("/people/77/sex")
        .json(&json!({ "value": "F" }))
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_body_is_json_error() {
    let server = server();

    let response = server
        .post("/people")
        .text("not json")
        .expect_failure()
        .await;
    response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body = response.json::<Value>();
    assert!(body["error"].is_string());

    let ana = create_ana(&server).await;
    let response = server
        .put(&format!("/people/{}/sex", ana.id))
        .json(&json!({ "value": 5 }))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.json::<Value>();
    assert!(body["error"].is_string());
    assert!(body.get("fields").is_none());
}

// =============================================================================
// FILTERS
// =============================================================================

#[tokio::test]
async fn test_oldest_and_youngest() {
    let seeded = seeded_server();

    let oldest = seeded.get("/filters/oldest").await.json::<Option<PersonDto>>();
    assert_eq!(oldest.unwrap().given_name, "Sérgio");

    let youngest = seeded.get("/filters/youngest").await.json::<Option<PersonDto>>();
    assert_eq!(youngest.unwrap().given_name, "Miguel");

    let empty = server();
    let none = empty.get("/filters/oldest").await.json::<Option<PersonDto>>();
    assert!(none.is_none());
}

#[tokio::test]
async fn test_minors_and_adults_partition() {
    let server = seeded_server();

    let minors = server.get("/filters/minors").await.json::<CutoffList>();
    let adults = server.get("/filters/adults").await.json::<CutoffList>();

    assert_eq!(minors.cutoff.to_string(), "2007-01-01");
    assert_eq!(minors.people.len() + adults.people.len(), 26);
    assert!(minors.people.iter().all(|p| p.age < 18));
    assert!(adults.people.iter().all(|p| p.age >= 18));
}

#[tokio::test]
async fn test_above_average() {
    let server = seeded_server();
    let body = server.get("/filters/above-average").await.json::<Value>();

    let average = body["average_age"].as_f64().unwrap();
    let people = body["people"].as_array().unwrap();
    assert!(!people.is_empty());
    for person in people {
        assert!(person["age"].as_f64().unwrap() > average);
    }
}

#[tokio::test]
async fn test_birth_month() {
    let server = seeded_server();

    let september = server
        .get("/filters/birth-month/9")
        .await
        .json::<Vec<PersonDto>>();
    assert!(
        september
            .iter()
            .all(|p| p.birth_date.format("%m").to_string() == "09")
    );
    assert!(september.iter().any(|p| p.given_name == "Gabriel"));

    server
        .get("/filters/birth-month/13")
        .expect_failure()
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_sex_filter_rejects_unknown_code() {
    let server = seeded_server();
    server
        .get("/filters/sex/X")
        .expect_failure()
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

// =============================================================================
// STATISTICS
// =============================================================================

#[tokio::test]
async fn test_stats() {
    let server = seeded_server();
    let stats = server.get("/stats").await.json::<Value>();

    assert_eq!(stats["total"], 26);
    let male = stats["by_sex"]["male"].as_u64().unwrap();
    let female = stats["by_sex"]["female"].as_u64().unwrap();
    assert_eq!(male + female, 26);

    let brackets = server.get("/stats/age-brackets").await.json::<Value>();
    let brackets = brackets.as_array().unwrap();
    assert_eq!(brackets.len(), 4);
    assert_eq!(brackets[0]["bracket"], "0-17");
    let total: u64 = brackets.iter().map(|b| b["count"].as_u64().unwrap()).sum();
    assert_eq!(total, 26);

    let months = server.get("/stats/birth-months").await.json::<Value>();
    let months = months.as_array().unwrap();
    assert_eq!(months.len(), 12);
    assert_eq!(months[0]["name"], "January");
}

#[tokio::test]
async fn test_stats_on_empty_registry() {
    let server = server();
    let stats = server.get("/stats").await.json::<Value>();
    assert_eq!(stats["total"], 0);
    assert_eq!(stats["mean_age"], 0.0);
    assert!(stats["oldest"].is_null());
}

// =============================================================================
// EXPORT
// =============================================================================

#[tokio::test]
async fn test_export_csv_download() {
    let server = server();
    create_ana(&server).await;

    let response = server.get("/export/csv").await;
    response.assert_status_ok();
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"pessoas.csv\""
    );
    assert!(
        response
            .header("content-type")
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    let text = response.text();
    assert!(text.contains("Ana;Silva;03/09/1999;Female;16559687775;25"));
}

#[tokio::test]
async fn test_export_xlsx_download() {
    let server = seeded_server();

    let response = server.get("/export/xlsx").await;
    response.assert_status_ok();
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"pessoas.xlsx\""
    );
    assert_eq!(&response.as_bytes()[..2], b"PK");
}

#[tokio::test]
async fn test_export_json_download() {
    let server = seeded_server();

    let rows = server.get("/export/json").await.json::<Vec<Value>>();
    assert_eq!(rows.len(), 26);
    assert_eq!(rows[0]["national_id"].as_str().unwrap().len(), 11);
}

#[tokio::test]
async fn test_export_empty_registry_is_not_found() {
    let server = server();
    server
        .get("/export/csv")
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_export_unknown_format() {
    let server = seeded_server();
    server
        .get("/export/pdf")
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// =============================================================================
// RATE LIMITING
// =============================================================================

#[tokio::test]
async fn test_rate_limit_rejects_burst() {
    let state = AppState::new(Registry::in_memory(), frozen_clock());
    let router = with_rate_limit(create_router(state), NonZeroU32::new(1).unwrap());
    let server = TestServer::new(router).unwrap();

    server.get("/health").await.assert_status_ok();
    server
        .get("/health")
        .expect_failure()
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}
