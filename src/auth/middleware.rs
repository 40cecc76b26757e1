use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::gate::AuthGate;
use crate::error::AppError;

/// Paths under the wrapped scope that do not require a session.
const PUBLIC_PATHS: &[&str] = &["/api", "/api/users/register", "/api/users/login"];

/// Runs the [`AuthGate`] in front of every request in the wrapped scope.
///
/// The gate is taken from `web::Data<AuthGate>` app data. On success the
/// resolved `AuthContext` is inserted into the request extensions; a rejection
/// is rendered as the error response right here and the inner service never runs.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        if PUBLIC_PATHS.contains(&req.path()) {
            return Box::pin(async move {
                service
                    .call(req)
                    .await
                    .map(ServiceResponse::map_into_left_body)
            });
        }

        let gate = req.app_data::<web::Data<AuthGate>>().cloned();
        let token = bearer_token(&req).map(str::to_owned);

        Box::pin(async move {
            let gate = match gate {
                Some(gate) => gate,
                None => {
                    log::error!("AuthMiddleware is active but no AuthGate is registered");
                    let err = AppError::InternalServerError("Authentication unavailable".into());
                    return Ok(req.error_response(err).map_into_right_body());
                }
            };

            match gate.authenticate(token.as_deref()).await {
                Ok(context) => {
                    req.extensions_mut().insert(context);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(reason) => Ok(req
                    .error_response(AppError::Rejected(reason))
                    .map_into_right_body()),
            }
        })
    }
}

/// Pulls the credential out of `Authorization: Bearer <token>`.
fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}
