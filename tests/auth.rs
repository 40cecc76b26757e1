use std::sync::Arc;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::middleware::Logger;
use actix_web::{test, web, App, HttpResponse, Responder};
use chrono::{Duration, Utc};
use jsonwebtoken::Algorithm;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use sqlx::PgPool;
use tasktrack::auth::AuthenticatedUser;
use tasktrack::routes::{self, health};
use tasktrack::{AuthGate, AuthMiddleware, MemorySessionStore, SessionStore, TokenService};

const SECRET: &str = "integration_test_secret";

/// Stand-in for a downstream handler: echoes what the gate attached.
async fn whoami(user: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().json(json!({ "user_id": user.user_id, "token": user.token }))
}

fn memory_gate() -> (web::Data<AuthGate>, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::new());
    let tokens = TokenService::new(SECRET, Algorithm::HS256).expect("valid token config");
    let gate = web::Data::new(AuthGate::new(tokens, store.clone()));
    (gate, store)
}

async fn init_app(
    gate: web::Data<AuthGate>,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(gate)
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .route("/whoami", web::get().to(whoami))
                    .configure(routes::config),
            ),
    )
    .await
}

fn whoami_request(token: Option<&str>) -> Request {
    let mut req = test::TestRequest::get().uri("/api/whoami");
    if let Some(token) = token {
        req = req.append_header((header::AUTHORIZATION, format!("Bearer {}", token)));
    }
    req.to_request()
}

async fn call_json(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    req: Request,
) -> (StatusCode, Value) {
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[test_log::test(actix_rt::test)]
async fn test_protected_route_sees_session_owner() {
    let (gate, _store) = memory_gate();
    let token = gate.start_session(7, "alice@example.com").await.unwrap();
    let app = init_app(gate).await;

    let (status, body) = call_json(&app, whoami_request(Some(&token))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "user_id": 7, "token": token }));
}

#[actix_rt::test]
async fn test_missing_token_is_rejected_as_expired() {
    let (gate, _store) = memory_gate();
    let app = init_app(gate).await;

    let (status, body) = call_json(&app, whoami_request(None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["reason"], "token_missing");
    assert_eq!(body["isExpired"], true);
}

#[actix_rt::test]
async fn test_non_bearer_scheme_counts_as_missing() {
    let (gate, _store) = memory_gate();
    let app = init_app(gate).await;

    let req = test::TestRequest::get()
        .uri("/api/whoami")
        .append_header((header::AUTHORIZATION, "Basic dXNlcjpwYXNz"))
        .to_request();
    let (status, body) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["reason"], "token_missing");
}

#[actix_rt::test]
async fn test_forged_token_is_invalid_and_its_row_purged() {
    let (gate, store) = memory_gate();
    let forger = TokenService::new("not_the_server_secret", Algorithm::HS256).unwrap();
    let forged = forger.issue("mallory@example.com").unwrap();
    store.create(&forged, 13).await.unwrap();
    let app = init_app(gate).await;

    let (status, body) = call_json(&app, whoami_request(Some(&forged))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["reason"], "token_invalid");
    assert_eq!(body["isExpired"], true);
    assert!(store.find(&forged).await.unwrap().is_none());
}

#[actix_rt::test]
async fn test_logout_ends_the_session() {
    let (gate, store) = memory_gate();
    let token = gate.start_session(3, "bob@example.com").await.unwrap();
    let app = init_app(gate).await;

    let logout = test::TestRequest::post()
        .uri("/api/users/logout")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .to_request();
    let (status, body) = call_json(&app, logout).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logout Successful");
    assert!(store.is_empty().await);

    let (status, body) = call_json(&app, whoami_request(Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["reason"], "session_not_found");
    assert_eq!(body["isExpired"], true);
}

#[actix_rt::test]
async fn test_sessions_of_one_user_are_independent() {
    let (gate, _store) = memory_gate();
    let first = gate.start_session(4, "carol@example.com").await.unwrap();
    let second = gate.start_session(4, "carol@example.com").await.unwrap();
    assert_ne!(first, second);
    let app = init_app(gate).await;

    let logout = test::TestRequest::get()
        .uri("/api/users/logout")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", first)))
        .to_request();
    let (status, _) = call_json(&app, logout).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call_json(&app, whoami_request(Some(&first))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call_json(&app, whoami_request(Some(&second))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], 4);
}

#[actix_rt::test]
async fn test_expired_token_is_flagged_then_removed() {
    let (gate, store) = memory_gate();
    let issued = Utc::now() - Duration::days(5) - Duration::hours(1);
    let token = gate.tokens().issue_at("dave@example.com", issued).unwrap();
    store.create(&token, 5).await.unwrap();
    let app = init_app(gate).await;

    let (status, body) = call_json(&app, whoami_request(Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["reason"], "session_expired");
    assert!(store.find(&token).await.unwrap().unwrap().is_expired);

    let (status, body) = call_json(&app, whoami_request(Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["reason"], "session_expired");
    assert!(store.is_empty().await);
}

#[actix_rt::test]
async fn test_concurrent_requests_with_expired_session() {
    let (gate, store) = memory_gate();
    let token = gate.start_session(6, "erin@example.com").await.unwrap();
    store.mark_expired(&token).await.unwrap();
    let app = init_app(gate).await;

    let (first, second) = futures::join!(
        call_json(&app, whoami_request(Some(&token))),
        call_json(&app, whoami_request(Some(&token)))
    );

    for (status, body) in [first, second] {
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["isExpired"], true);
        assert!(
            body["reason"] == "session_expired" || body["reason"] == "session_not_found",
            "unexpected body {}",
            body
        );
    }
    assert!(store.is_empty().await);
}

#[actix_rt::test]
async fn test_public_routes_skip_the_gate() {
    let (gate, _store) = memory_gate();
    let app = init_app(gate).await;

    let (status, body) = call_json(&app, test::TestRequest::get().uri("/api").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Personal Task Manager API");

    let (status, body) = call_json(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessions"], "memory");
}

#[actix_rt::test]
async fn test_protected_task_routes_require_a_session() {
    let (gate, _store) = memory_gate();
    let app = init_app(gate).await;

    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .set_json(json!({ "title": "Unauthorized Task" }))
        .to_request();
    let (status, body) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["reason"], "token_missing");
}

#[actix_rt::test]
async fn test_page_beyond_range_is_a_bad_request() {
    let (gate, _store) = memory_gate();
    let token = gate.start_session(8, "frank@example.com").await.unwrap();
    // Never connected: the request is refused before any query runs.
    let pool = PgPool::connect_lazy("postgres://localhost/unused").unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool))
            .app_data(gate)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/tasks?page=9223372036854775807&limit=10")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .to_request();
    let (status, body) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "page is out of range");
}
