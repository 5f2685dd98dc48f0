use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use gradr::api::AppState;
use gradr::config::Config;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

const JANE: (&str, &str) = ("jane@example.com", "correct horse battery");
const OMAR: (&str, &str) = ("omar@example.com", "s3cret:with:colons");

async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_url = "sqlite::memory:".to_string();
    // A single pooled connection keeps every query on the same in-memory DB.
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;

    let state = gradr::api::create_app_state_from_config(config.clone(), None)
        .await
        .expect("Failed to create app state");

    for (email, password) in [JANE, OMAR] {
        state
            .store()
            .create_user("Test", "User", email, password, &config.security)
            .await
            .expect("Failed to seed user");
    }

    (gradr::api::router(state.clone()), state)
}

fn basic_auth(credentials: (&str, &str)) -> String {
    format!(
        "Basic {}",
        BASE64.encode(format!("{}:{}", credentials.0, credentials.1))
    )
}

fn valid_assignment() -> serde_json::Value {
    serde_json::json!({
        "name": "HW1",
        "points": 5,
        "num_of_attempts": 3,
        "deadline": "2099-01-01"
    })
}

async fn post_assignment(
    app: &Router,
    user: (&str, &str),
    body: &serde_json::Value,
) -> StatusCode {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/assignments")
                .header(header::AUTHORIZATION, basic_auth(user))
                .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(Body::from(serde_json::to_string(body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    response.status()
}

/// Creates an assignment and returns its id, read back from the list
/// endpoint since creation returns an empty body.
async fn create_assignment_id(
    app: &Router,
    user: (&str, &str),
    body: &serde_json::Value,
) -> String {
    assert_eq!(post_assignment(app, user, body).await, StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/assignments")
                .header(header::AUTHORIZATION, basic_auth(user))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let list: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let items = list.as_array().unwrap();
    items
        .last()
        .and_then(|a| a["id"].as_str())
        .expect("created assignment present in list")
        .to_string()
}

#[tokio::test]
async fn test_healthz() {
    let (app, _state) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-cache, no-store, must-revalidate"
    );

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/healthz?probe=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .header(header::CONTENT_LENGTH, "2")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_auth_runs_before_validation() {
    let (app, _state) = spawn_app().await;

    // No header, non-Basic scheme and wrong password all end the same way,
    // even with a payload the validator would reject.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/assignments")
                .body(Body::from("{\"bogus\": true}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/assignments")
                .header(header::AUTHORIZATION, "Bearer some-token")
                .body(Body::from("{\"bogus\": true}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let status = post_assignment(&app, (JANE.0, "wrong password"), &valid_assignment()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_password_with_colons_authenticates() {
    let (app, _state) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/assignments")
                .header(header::AUTHORIZATION, basic_auth(OMAR))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_assignment_payload_validation() {
    let (app, _state) = spawn_app().await;

    let mut body = valid_assignment();
    body.as_object_mut().unwrap().remove("points");
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/assignments")
                .header(header::AUTHORIZATION, basic_auth(JANE))
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let text = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&text).contains("points"));

    let mut body = valid_assignment();
    body["grade"] = serde_json::json!("A+");
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/assignments")
                .header(header::AUTHORIZATION, basic_auth(JANE))
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let text = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&text).contains("grade"));

    let mut body = valid_assignment();
    body["points"] = serde_json::json!(4.5);
    assert_eq!(
        post_assignment(&app, JANE, &body).await,
        StatusCode::BAD_REQUEST
    );

    let mut body = valid_assignment();
    body["num_of_attempts"] = serde_json::json!("three");
    assert_eq!(
        post_assignment(&app, JANE, &body).await,
        StatusCode::BAD_REQUEST
    );

    let mut body = valid_assignment();
    body["deadline"] = serde_json::json!("next tuesday");
    assert_eq!(
        post_assignment(&app, JANE, &body).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_points_bounds_enforced_by_store() {
    let (app, _state) = spawn_app().await;

    let mut body = valid_assignment();
    body["points"] = serde_json::json!(11);
    assert_eq!(
        post_assignment(&app, JANE, &body).await,
        StatusCode::BAD_REQUEST
    );

    let mut body = valid_assignment();
    body["num_of_attempts"] = serde_json::json!(0);
    assert_eq!(
        post_assignment(&app, JANE, &body).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_assignment_crud_round_trip() {
    let (app, _state) = spawn_app().await;

    let id = create_assignment_id(&app, JANE, &valid_assignment()).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/assignments/{id}"))
                .header(header::AUTHORIZATION, basic_auth(JANE))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let item: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(item["name"], "HW1");
    assert_eq!(item["points"], 5);

    let mut updated = valid_assignment();
    updated["name"] = serde_json::json!("HW1 (revised)");
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/assignments/{id}"))
                .header(header::AUTHORIZATION, basic_auth(JANE))
                .body(Body::from(serde_json::to_string(&updated).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/assignments/{id}"))
                .header(header::AUTHORIZATION, basic_auth(JANE))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let item: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(item["name"], "HW1 (revised)");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/assignments/{id}"))
                .header(header::AUTHORIZATION, basic_auth(JANE))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/assignments/{id}"))
                .header(header::AUTHORIZATION, basic_auth(JANE))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_assignment_is_404() {
    let (app, _state) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/assignments/00000000-0000-4000-8000-000000000000")
                .header(header::AUTHORIZATION, basic_auth(JANE))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_body_on_read_is_rejected() {
    let (app, _state) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/assignments")
                .header(header::AUTHORIZATION, basic_auth(JANE))
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_owner_is_forbidden() {
    let (app, _state) = spawn_app().await;

    let id = create_assignment_id(&app, JANE, &valid_assignment()).await;

    // 403 beats payload validation: the body here is garbage.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/assignments/{id}"))
                .header(header::AUTHORIZATION, basic_auth(OMAR))
                .body(Body::from("{\"bogus\": true}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/assignments/{id}"))
                .header(header::AUTHORIZATION, basic_auth(OMAR))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The owner still can.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/assignments/{id}"))
                .header(header::AUTHORIZATION, basic_auth(JANE))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

async fn post_submission(
    app: &Router,
    user: (&str, &str),
    assignment_id: &str,
    body: &serde_json::Value,
) -> StatusCode {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/assignments/{assignment_id}/submissions"))
                .header(header::AUTHORIZATION, basic_auth(user))
                .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(Body::from(serde_json::to_string(body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    response.status()
}

#[tokio::test]
async fn test_submission_attempt_limit() {
    let (app, _state) = spawn_app().await;

    let mut assignment = valid_assignment();
    assignment["num_of_attempts"] = serde_json::json!(2);
    let id = create_assignment_id(&app, JANE, &assignment).await;

    let body = serde_json::json!({ "submission_url": "https://example.com/hw1.zip" });

    assert_eq!(
        post_submission(&app, JANE, &id, &body).await,
        StatusCode::CREATED
    );
    assert_eq!(
        post_submission(&app, JANE, &id, &body).await,
        StatusCode::CREATED
    );
    assert_eq!(
        post_submission(&app, JANE, &id, &body).await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_submission_body_validation() {
    let (app, _state) = spawn_app().await;

    let id = create_assignment_id(&app, JANE, &valid_assignment()).await;

    let body = serde_json::json!({ "submission_url": "x", "note": "late" });
    assert_eq!(
        post_submission(&app, JANE, &id, &body).await,
        StatusCode::BAD_REQUEST
    );

    let body = serde_json::json!({ "url": "x" });
    assert_eq!(
        post_submission(&app, JANE, &id, &body).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_submission_for_unknown_assignment_is_404() {
    let (app, _state) = spawn_app().await;

    let body = serde_json::json!({ "submission_url": "x" });
    assert_eq!(
        post_submission(&app, JANE, "00000000-0000-4000-8000-000000000000", &body).await,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_submission_after_deadline_is_rejected() {
    let (app, _state) = spawn_app().await;

    let mut assignment = valid_assignment();
    assignment["deadline"] = serde_json::json!("2001-01-01");
    let id = create_assignment_id(&app, JANE, &assignment).await;

    let body = serde_json::json!({ "submission_url": "x" });
    assert_eq!(
        post_submission(&app, JANE, &id, &body).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_delete_blocked_by_existing_submission() {
    let (app, _state) = spawn_app().await;

    let id = create_assignment_id(&app, JANE, &valid_assignment()).await;

    let body = serde_json::json!({ "submission_url": "x" });
    assert_eq!(
        post_submission(&app, JANE, &id, &body).await,
        StatusCode::CREATED
    );

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/assignments/{id}"))
                .header(header::AUTHORIZATION, basic_auth(JANE))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submission_returns_attempt_counter() {
    let (app, _state) = spawn_app().await;

    let id = create_assignment_id(&app, JANE, &valid_assignment()).await;

    let body = serde_json::json!({ "submission_url": "https://example.com/v1.zip" });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/assignments/{id}/submissions"))
                .header(header::AUTHORIZATION, basic_auth(JANE))
                .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let submission: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(submission["attempts"], 1);
    assert_eq!(submission["submission_url"], "https://example.com/v1.zip");

    let body = serde_json::json!({ "submission_url": "https://example.com/v2.zip" });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/assignments/{id}/submissions"))
                .header(header::AUTHORIZATION, basic_auth(JANE))
                .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let submission: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(submission["attempts"], 2);
    assert_eq!(submission["submission_url"], "https://example.com/v2.zip");
}
