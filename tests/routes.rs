use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use pension_crm::models::auth::AuthenticatedUser;
use pension_crm::models::config::ServerConfig;
use pension_crm::routes;
use serde_json::{Value, json};

mod common;

use common::{
    ADMIN, AREA_AGENT, BRANCH_AGENT, CLIENT_BRANCH_10, CLIENT_BRANCH_11, CLIENT_BRANCH_20, NOBODY,
    ORG, PAID, PENDING, TestDb,
};

const SECRET: &str = "test-secret";

fn server_config() -> ServerConfig {
    ServerConfig {
        address: "127.0.0.1".into(),
        port: 0,
        database_url: String::new(),
        secret: SECRET.into(),
    }
}

fn bearer(user_id: i32) -> (&'static str, String) {
    let claims = AuthenticatedUser {
        sub: user_id.to_string(),
        email: format!("user{user_id}@example.com"),
        name: format!("User {user_id}"),
        organization_id: ORG,
        exp: 4_102_444_800,
    };
    let token = claims.to_token(SECRET).expect("signed token");
    ("Authorization", format!("Bearer {token}"))
}

fn body(client_id: i32, status_type_id: i32) -> Value {
    json!({
        "client_id": client_id,
        "period_type": "monthly",
        "year": 2024,
        "month": 1,
        "status_type_id": status_type_id
    })
}

macro_rules! app {
    ($db:expr) => {
        test::init_service(
            App::new()
                .configure(routes::configure)
                .app_data(web::Data::new($db.repo()))
                .app_data(web::Data::new(server_config())),
        )
        .await
    };
}

#[actix_web::test]
async fn test_missing_or_bad_token_is_unauthorized() {
    let db = TestDb::seeded("test_missing_or_bad_token_is_unauthorized.db");
    let app = app!(db);

    let req = test::TestRequest::get().uri("/api/v1/status-types").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/status-types")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let value: Value = test::read_body_json(resp).await;
    assert_eq!(value["error"]["code"], "UNAUTHORIZED");
}

#[actix_web::test]
async fn test_update_then_read_current_status() {
    let db = TestDb::seeded("test_update_then_read_current_status.db");
    let app = app!(db);

    let req = test::TestRequest::post()
        .uri("/api/v1/status")
        .insert_header(bearer(ADMIN))
        .set_json(body(CLIENT_BRANCH_10, PENDING))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let value: Value = test::read_body_json(resp).await;
    assert_eq!(value["event_sequence"], 1);
    assert_eq!(value["update_count"], 1);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/clients/{CLIENT_BRANCH_10}/status?period_type=monthly&year=2024&month=1"
        ))
        .insert_header(bearer(ADMIN))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let value: Value = test::read_body_json(resp).await;
    assert_eq!(value["status_type_id"], PENDING);
    assert_eq!(value["period"]["period_type"], "monthly");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/clients/{CLIENT_BRANCH_10}/status/history"))
        .insert_header(bearer(ADMIN))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let value: Value = test::read_body_json(resp).await;
    assert_eq!(value["total"], 1);
    assert_eq!(value["items"][0]["event"]["event_sequence"], 1);
}

#[actix_web::test]
async fn test_error_statuses() {
    let db = TestDb::seeded("test_error_statuses.db");
    let app = app!(db);

    // No capability.
    let req = test::TestRequest::post()
        .uri("/api/v1/status")
        .insert_header(bearer(NOBODY))
        .set_json(body(CLIENT_BRANCH_10, PENDING))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let value: Value = test::read_body_json(resp).await;
    assert_eq!(value["error"]["code"], "FORBIDDEN");

    // Unknown client.
    let req = test::TestRequest::post()
        .uri("/api/v1/status")
        .insert_header(bearer(ADMIN))
        .set_json(body(9999, PENDING))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Reason required.
    let req = test::TestRequest::post()
        .uri("/api/v1/status")
        .insert_header(bearer(ADMIN))
        .set_json(body(CLIENT_BRANCH_10, common::DECLINED))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let value: Value = test::read_body_json(resp).await;
    assert_eq!(value["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(value["error"]["details"]["kind"], "missing_reason");

    // Terminal status blocks further changes.
    for (status, expected) in [(PAID, StatusCode::OK), (PENDING, StatusCode::CONFLICT)] {
        let req = test::TestRequest::post()
            .uri("/api/v1/status")
            .insert_header(bearer(ADMIN))
            .set_json(body(CLIENT_BRANCH_10, status))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected);
    }

    // Malformed body shape.
    let req = test::TestRequest::post()
        .uri("/api/v1/status")
        .insert_header(bearer(ADMIN))
        .set_json(json!({ "client_id": "one" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let value: Value = test::read_body_json(resp).await;
    assert_eq!(value["error"]["code"], "VALIDATION_ERROR");

    // Query without the required year.
    let req = test::TestRequest::get()
        .uri("/api/v1/statuses?period_type=monthly")
        .insert_header(bearer(ADMIN))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Out of territory read.
    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/clients/{CLIENT_BRANCH_10}/status?period_type=monthly&year=2024&month=1"
        ))
        .insert_header(bearer(BRANCH_AGENT))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_bulk_update_reports_per_item_results() {
    let db = TestDb::seeded("test_bulk_update_reports_per_item_results.db");
    let app = app!(db);

    let req = test::TestRequest::post()
        .uri("/api/v1/status/bulk")
        .insert_header(bearer(AREA_AGENT))
        .set_json(json!({
            "updates": [
                body(CLIENT_BRANCH_10, PENDING),
                body(9999, PENDING),
                body(CLIENT_BRANCH_11, PENDING),
                body(CLIENT_BRANCH_20, PENDING),
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let value: Value = test::read_body_json(resp).await;
    assert_eq!(value["successful"], 2);
    assert_eq!(value["failed"], 2);
    assert_eq!(value["results"][0]["success"], true);
    assert_eq!(value["results"][1]["success"], false);
    assert_eq!(value["results"][1]["client_id"], 9999);
    assert_eq!(value["results"][1]["error_code"], "NOT_FOUND");
    assert_eq!(value["results"][3]["error_code"], "FORBIDDEN");

    let req = test::TestRequest::post()
        .uri("/api/v1/status/bulk")
        .insert_header(bearer(AREA_AGENT))
        .set_json(json!({ "updates": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::post()
        .uri("/api/v1/status/bulk")
        .insert_header(bearer(BRANCH_AGENT))
        .set_json(json!({ "updates": [body(CLIENT_BRANCH_20, PENDING)] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_listings() {
    let db = TestDb::seeded("test_listings.db");
    let app = app!(db);

    for client in [CLIENT_BRANCH_10, CLIENT_BRANCH_20] {
        let req = test::TestRequest::post()
            .uri("/api/v1/status")
            .insert_header(bearer(ADMIN))
            .set_json(body(client, PENDING))
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());
    }

    let req = test::TestRequest::get()
        .uri("/api/v1/statuses?period_type=monthly&year=2024&month=1")
        .insert_header(bearer(BRANCH_AGENT))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let value: Value = test::read_body_json(resp).await;
    assert_eq!(value["total"], 1);
    assert_eq!(value["items"][0]["client_id"], CLIENT_BRANCH_20);

    let req = test::TestRequest::get()
        .uri("/api/v1/status-types")
        .insert_header(bearer(AREA_AGENT))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let value: Value = test::read_body_json(resp).await;
    let types = value.as_array().expect("array of status types");
    assert_eq!(types.len(), 6);
    assert_eq!(types[0]["code"], "PENDING");
    assert!(types[0]["reasons"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_huge_page_number_returns_empty_page() {
    let db = TestDb::seeded("test_huge_page_number_returns_empty_page.db");
    let app = app!(db);

    let req = test::TestRequest::post()
        .uri("/api/v1/status")
        .insert_header(bearer(ADMIN))
        .set_json(body(CLIENT_BRANCH_10, PENDING))
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/statuses?period_type=monthly&year=2024&month=1&page={}",
            usize::MAX
        ))
        .insert_header(bearer(ADMIN))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let value: Value = test::read_body_json(resp).await;
    assert_eq!(value["total"], 1);
    assert!(value["items"].as_array().unwrap().is_empty());
}
