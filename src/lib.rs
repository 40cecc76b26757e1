#![doc = "The `tasktrack` library crate."]
#![doc = ""]
#![doc = "Token issuance, session storage and the authentication gate, plus the"]
#![doc = "user and task routes built on top of them. The binary (`main.rs`) wires"]
#![doc = "these into an actix-web server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod session;

pub use crate::auth::{AuthGate, AuthMiddleware, TokenService};
pub use crate::error::AppError;
pub use crate::session::{MemorySessionStore, PgSessionStore, SessionStore};
