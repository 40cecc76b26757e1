pub mod health;
pub mod tasks;
pub mod users;

use actix_web::web;

/// Routes mounted under `/api`. Wrap the scope with `AuthMiddleware`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health::index)
        .service(
            web::scope("/users")
                .service(users::register)
                .service(users::login)
                .service(users::logout)
                .service(users::me),
        )
        .service(
            web::scope("/tasks")
                .service(tasks::get_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::toggle_task_completion)
                .service(tasks::delete_task),
        );
}
