use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered account as returned by the API. The password hash never leaves the database layer.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Credentials row used only by the login handler.
#[derive(Debug, FromRow)]
pub struct UserCredentials {
    pub id: i32,
    pub email: String,
    pub password: String,
}
