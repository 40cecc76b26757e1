use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::gate::{AuthContext, RejectReason};
use crate::error::AppError;

/// The caller resolved by `AuthMiddleware`: owner id plus the token it presented.
///
/// Handlers behind the middleware take this as an argument and trust it
/// without re-validating. If the middleware did not run, extraction fails with
/// a `token_missing` rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub token: String,
}

impl From<AuthContext> for AuthenticatedUser {
    fn from(context: AuthContext) -> Self {
        Self {
            user_id: context.user_id,
            token: context.token,
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthContext>().cloned() {
            Some(context) => ready(Ok(context.into())),
            None => {
                log::warn!("no AuthContext on {}; is AuthMiddleware applied?", req.path());
                ready(Err(AppError::Rejected(RejectReason::TokenMissing).into()))
            }
        }
    }
}
