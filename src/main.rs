use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;

use tasktrack::config::{Config, SessionBackend};
use tasktrack::routes::{self, health};
use tasktrack::{
    AuthGate, AuthMiddleware, MemorySessionStore, PgSessionStore, SessionStore, TokenService,
};

fn startup_error(err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env().map_err(startup_error)?;
    let tokens = TokenService::from_config(&config).map_err(startup_error)?;

    let pool = PgPool::connect(&config.database_url)
        .await
        .map_err(startup_error)?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(startup_error)?;

    let sessions: Arc<dyn SessionStore> = match config.session_backend {
        SessionBackend::Postgres => Arc::new(PgSessionStore::new(pool.clone())),
        SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
    };
    log::info!("session backend: {}", sessions.backend());

    let gate = web::Data::new(AuthGate::new(tokens, sessions));
    let pool = web::Data::new(pool);

    log::info!("Starting server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(pool.clone())
            .app_data(gate.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
