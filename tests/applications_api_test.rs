use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::Duration;
use dakshath_backend::{
    database::MemoryStore,
    middleware::auth::Claims,
    models::{job::JobStatus, student_score::StudentScore, user::Role},
    routes,
    utils::pagination::MAX_PAGE,
    AppState,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use rust_decimal::Decimal;
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test_secret_key";

struct Fixture {
    app: Router,
    student: Uuid,
    hr: Uuid,
    admin: Uuid,
    open_job: Uuid,
    hard_job: Uuid,
}

fn token_for(user_id: Uuid, role: Role) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        role: Some(role.to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn setup(api_rps: u32) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let student = store.add_user("Asha Rao", Role::Student).unwrap();
    let hr = store.add_user("Hiro Tan", Role::Hr).unwrap();
    let admin = store.add_user("Ada Admin", Role::Admin).unwrap();
    let company = store.add_company("Acme Labs").unwrap();
    store.add_hr_member(hr.id, company).unwrap();
    let open_job = store
        .add_job(company, "Backend Intern", JobStatus::Active, Decimal::new(60, 0))
        .unwrap();
    let hard_job = store
        .add_job(company, "Staff Engineer", JobStatus::Active, Decimal::new(95, 0))
        .unwrap();
    store
        .set_score(StudentScore {
            student_id: student.id,
            overall_score: Some(Decimal::new(80, 0)),
            course_average: Some(Decimal::new(75, 0)),
            test_average: Some(Decimal::new(85, 0)),
            project_average: None,
            hackathon_average: None,
            last_calculated_at: Some(chrono::Utc::now()),
        })
        .unwrap();

    let state = AppState::from_store(store, SECRET, Duration::hours(24));
    Fixture {
        app: routes::router(state, api_rps, None),
        student: student.id,
        hr: hr.id,
        admin: admin.id,
        open_job: open_job.id,
        hard_job: hard_job.id,
    }
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn health_is_public() {
    let fx = setup(100);
    let (status, body) = send(&fx.app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn api_requires_a_valid_token() {
    let fx = setup(100);
    let (status, body) = send(&fx.app, "GET", "/api/applications/student", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = send(
        &fx.app,
        "GET",
        "/api/applications/student",
        Some("not-a-jwt"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deactivated_accounts_are_rejected() {
    let store = Arc::new(MemoryStore::new());
    let student = store.add_user("Dana Gone", Role::Student).unwrap();
    store.deactivate_user(student.id).unwrap();
    let app = routes::router(
        AppState::from_store(store, SECRET, Duration::hours(24)),
        100,
        None,
    );

    let token = token_for(student.id, Role::Student);
    let (status, body) = send(&app, "GET", "/api/notifications", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "User not found or inactive");
}

#[tokio::test]
async fn student_applies_once_per_job() {
    let fx = setup(100);
    let student = token_for(fx.student, Role::Student);
    let payload = json!({
        "job_listing_id": fx.open_job,
        "cover_letter": "I would love to join.",
    });

    let (status, body) = send(
        &fx.app,
        "POST",
        "/api/applications",
        Some(&student),
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Application submitted successfully");
    assert_eq!(body["data"]["status"], "applied");
    assert_eq!(body["data"]["job_title"], "Backend Intern");
    assert_eq!(body["data"]["company_name"], "Acme Labs");

    let (status, body) = send(
        &fx.app,
        "POST",
        "/api/applications",
        Some(&student),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, body) = send(
        &fx.app,
        "GET",
        "/api/applications/student",
        Some(&student),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
}

#[tokio::test]
async fn score_below_requirement_is_rejected() {
    let fx = setup(100);
    let student = token_for(fx.student, Role::Student);
    let (status, body) = send(
        &fx.app,
        "POST",
        "/api/applications",
        Some(&student),
        Some(json!({ "job_listing_id": fx.hard_job })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "BUSINESS_LOGIC_ERROR");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("You do not meet the minimum score requirement."));
}

#[tokio::test]
async fn role_gates_guard_route_groups() {
    let fx = setup(100);
    let student = token_for(fx.student, Role::Student);
    let hr = token_for(fx.hr, Role::Hr);

    let (status, body) = send(&fx.app, "GET", "/api/hr-requests", Some(&student), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["message"], "Access denied. Required role: hr or admin");

    let (status, _) = send(&fx.app, "GET", "/api/jobs/qualified", Some(&hr), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn hr_changes_go_through_admin_review() {
    let fx = setup(100);
    let student = token_for(fx.student, Role::Student);
    let hr = token_for(fx.hr, Role::Hr);
    let admin = token_for(fx.admin, Role::Admin);

    let (_, body) = send(
        &fx.app,
        "POST",
        "/api/applications",
        Some(&student),
        Some(json!({ "job_listing_id": fx.open_job })),
    )
    .await;
    let application_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &fx.app,
        "PUT",
        &format!("/api/applications/{}/status", application_id),
        Some(&hr),
        Some(json!({ "status": "accepted" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, body) = send(
        &fx.app,
        "POST",
        "/api/hr-requests",
        Some(&hr),
        Some(json!({
            "application_id": application_id,
            "request_type": "status_update",
            "requested_status": "interview_scheduled",
            "message": "Strong profile, please move to interview.",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "pending");
    let request_id = body["data"]["id"].as_str().unwrap().to_string();
    let process_uri = format!("/api/hr-requests/{}/process", request_id);

    let (status, _) = send(
        &fx.app,
        "PUT",
        &process_uri,
        Some(&hr),
        Some(json!({ "action": "approve" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &fx.app,
        "PUT",
        &process_uri,
        Some(&admin),
        Some(json!({ "action": "approve", "admin_notes": "Go ahead" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Request approved successfully");
    assert_eq!(body["data"]["status"], "completed");

    let (status, body) = send(
        &fx.app,
        "PUT",
        &process_uri,
        Some(&admin),
        Some(json!({ "action": "reject" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "BUSINESS_LOGIC_ERROR");

    let (status, body) = send(
        &fx.app,
        "GET",
        &format!("/api/applications/{}", application_id),
        Some(&student),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "interview_scheduled");
    let history = body["data"]["status_history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["status"], "interview_scheduled");
    assert_eq!(history[1]["status"], "applied");

    let (status, body) = send(
        &fx.app,
        "GET",
        "/api/notifications/unread-count",
        Some(&student),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["unread_count"], 1);
}

#[tokio::test]
async fn admin_updates_status_directly() {
    let fx = setup(100);
    let student = token_for(fx.student, Role::Student);
    let admin = token_for(fx.admin, Role::Admin);

    let (_, body) = send(
        &fx.app,
        "POST",
        "/api/applications",
        Some(&student),
        Some(json!({ "job_listing_id": fx.open_job })),
    )
    .await;
    let application_id = body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/applications/{}/status", application_id);

    let (status, body) = send(
        &fx.app,
        "PUT",
        &uri,
        Some(&admin),
        Some(json!({ "status": "promoted" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        &fx.app,
        "PUT",
        &uri,
        Some(&admin),
        Some(json!({ "status": "under_review", "admin_notes": "Looks promising" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "under_review");
    assert_eq!(body["data"]["hr_notes"], "Admin Notes: Looks promising");
    assert_eq!(body["data"]["reviewed_by"], fx.admin.to_string());
}

#[tokio::test]
async fn students_read_only_their_own_score() {
    let fx = setup(100);
    let student = token_for(fx.student, Role::Student);
    let hr = token_for(fx.hr, Role::Hr);

    let (status, body) = send(&fx.app, "GET", "/api/students/me/score", Some(&student), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["available"], true);

    let other = Uuid::new_v4();
    let (status, _) = send(
        &fx.app,
        "GET",
        &format!("/api/students/{}/score", other),
        Some(&student),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &fx.app,
        "GET",
        &format!("/api/students/{}/score", other),
        Some(&hr),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["available"], false);
}

#[tokio::test]
async fn qualified_jobs_reflect_the_student_score() {
    let fx = setup(100);
    let student = token_for(fx.student, Role::Student);
    let (status, body) = send(&fx.app, "GET", "/api/jobs/qualified", Some(&student), None).await;
    assert_eq!(status, StatusCode::OK);
    let jobs = body["data"].as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["id"], fx.open_job.to_string());
    assert_eq!(jobs[0]["qualification_status"], "qualified");
    assert_eq!(jobs[0]["has_applied"], false);
}

#[tokio::test]
async fn api_is_rate_limited() {
    let fx = setup(1);
    let (status, _) = send(&fx.app, "GET", "/api/notifications", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = send(&fx.app, "GET", "/api/notifications", None, None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "RATE_LIMIT_EXCEEDED");

    let (status, _) = send(&fx.app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn far_pages_come_back_empty() {
    let fx = setup(100);
    let student = token_for(fx.student, Role::Student);
    send(
        &fx.app,
        "POST",
        "/api/applications",
        Some(&student),
        Some(json!({ "job_listing_id": fx.open_job })),
    )
    .await;

    let (status, body) = send(
        &fx.app,
        "GET",
        &format!("/api/applications/student?page={}&limit=100", i64::MAX),
        Some(&student),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    assert_eq!(body["meta"]["page"], MAX_PAGE);
    assert_eq!(body["meta"]["total"], 1);
}

#[tokio::test]
async fn malformed_bodies_use_the_error_envelope() {
    let fx = setup(100);
    let student = token_for(fx.student, Role::Student);
    let req = Request::builder()
        .method("POST")
        .uri("/api/applications")
        .header("authorization", format!("Bearer {}", student))
        .header("content-type", "application/json")
        .body(Body::from("{\"job_listing_id\": "))
        .unwrap();
    let resp = fx.app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}
