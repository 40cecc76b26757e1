use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::auth::AuthGate;

/// Health check endpoint
///
/// Reports liveness and which backend holds the sessions.
#[get("/health")]
pub async fn health(gate: web::Data<AuthGate>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "sessions": gate.sessions().backend(),
        "timestamp": Utc::now()
    }))
}

/// Landing route of the API scope.
#[get("")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({ "message": "Personal Task Manager API" }))
}
