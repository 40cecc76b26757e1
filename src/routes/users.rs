use crate::{
    auth::{
        hash_password, verify_password, AuthGate, AuthResponse, AuthenticatedUser, LoginRequest,
        RegisterRequest,
    },
    error::AppError,
    models::{User, UserCredentials},
};
use actix_web::{get, post, route, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// Register a new user
///
/// Creates the account, opens a session and returns its bearer token.
/// If the session cannot be opened the account is removed again, so the
/// registration can simply be retried.
///
/// ## Responses:
/// - `201 Created`: `AuthResponse` with the new token.
/// - `409 Conflict`: The email is already registered.
/// - `422 Unprocessable Entity`: Invalid name, email or password.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    gate: web::Data<AuthGate>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let existing_user = sqlx::query_as::<_, (i32,)>("SELECT id FROM users WHERE email = $1")
        .bind(&register_data.email)
        .fetch_optional(&**pool)
        .await?;

    if existing_user.is_some() {
        return Err(AppError::Conflict("User already exists".into()));
    }

    let password_hash = hash_password(&register_data.password)?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, password) VALUES ($1, $2, $3)
         RETURNING id, name, email, created_at",
    )
    .bind(&register_data.name)
    .bind(&register_data.email)
    .bind(password_hash)
    .fetch_one(&**pool)
    .await
    .map_err(|err| match AppError::from(err) {
        // A concurrent registration won the race past the lookup above.
        AppError::Conflict(_) => AppError::Conflict("User already exists".into()),
        other => other,
    })?;

    let token = match gate.start_session(user.id, &user.email).await {
        Ok(token) => token,
        Err(err) => {
            // Without a session the client never learns it registered; undo the account.
            log::warn!("session for new user {} failed, removing account: {}", user.id, err);
            if let Err(cleanup) = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(user.id)
                .execute(&**pool)
                .await
            {
                log::error!(
                    "could not remove user {} after failed registration: {}",
                    user.id,
                    cleanup
                );
            }
            return Err(err);
        }
    };

    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        user_id: user.id,
    }))
}

/// Login user
///
/// Every successful login opens a new, independent session.
///
/// ## Responses:
/// - `200 OK`: `AuthResponse` with the new token.
/// - `401 Unauthorized`: Unknown email or wrong password.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    gate: web::Data<AuthGate>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user = sqlx::query_as::<_, UserCredentials>(
        "SELECT id, email, password FROM users WHERE email = $1",
    )
    .bind(&login_data.email)
    .fetch_optional(&**pool)
    .await?;

    match user {
        Some(user) if verify_password(&login_data.password, &user.password)? => {
            let token = gate.start_session(user.id, &user.email).await?;
            Ok(HttpResponse::Ok().json(AuthResponse {
                token,
                user_id: user.id,
            }))
        }
        _ => Err(AppError::Unauthorized("Invalid credentials".into())),
    }
}

/// Current user's profile.
#[get("")]
pub async fn me(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let profile = sqlx::query_as::<_, User>(
        "SELECT id, name, email, created_at FROM users WHERE id = $1",
    )
    .bind(user.user_id)
    .fetch_optional(&**pool)
    .await?;

    match profile {
        Some(profile) => Ok(HttpResponse::Ok().json(profile)),
        None => Err(AppError::NotFound("User not found".into())),
    }
}

/// Logout user
///
/// Ends the session behind the presented token. Repeating it is harmless.
#[route("/logout", method = "GET", method = "POST")]
pub async fn logout(
    gate: web::Data<AuthGate>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    gate.logout(&user.token).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Logout Successful" })))
}
