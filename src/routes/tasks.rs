use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{Task, TaskInput, TaskQuery, TaskUpdate},
};
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

const TASK_COLUMNS: &str = "id, title, description, is_completed, deadline, user_id, created_at";

/// Lists the authenticated user's tasks, newest first.
///
/// ## Query Parameters:
/// - `page` (optional): 1-based page number, default 1.
/// - `limit` (optional): page size, default 10, at most 100.
/// - `isCompleted` (optional): `1` for completed tasks, any other value for open ones.
///
/// A `page` so large that its offset overflows is a `400 Bad Request`.
#[get("")]
pub async fn get_tasks(
    pool: web::Data<PgPool>,
    query_params: web::Query<TaskQuery>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let offset = query_params
        .offset()
        .ok_or_else(|| AppError::BadRequest("page is out of range".into()))?;

    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE user_id = $1 AND ($2::BOOLEAN IS NULL OR is_completed = $2)
         ORDER BY created_at DESC, id DESC
         LIMIT $3 OFFSET $4"
    );

    let tasks = sqlx::query_as::<_, Task>(&sql)
        .bind(user.user_id)
        .bind(query_params.completed_filter())
        .bind(query_params.limit())
        .bind(offset)
        .fetch_all(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a task owned by the authenticated user.
///
/// ## Responses:
/// - `201 Created`: The new `Task`.
/// - `422 Unprocessable Entity`: Title or description out of bounds.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    task_data: web::Json<TaskInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let input = task_data.into_inner();

    let sql = format!(
        "INSERT INTO tasks (title, description, deadline, user_id)
         VALUES ($1, $2, $3, $4)
         RETURNING {TASK_COLUMNS}"
    );
    let task = sqlx::query_as::<_, Task>(&sql)
        .bind(input.title)
        .bind(input.description)
        .bind(input.deadline)
        .bind(user.user_id)
        .fetch_one(&**pool)
        .await?;

    Ok(HttpResponse::Created().json(task))
}

/// Fetches one task. Tasks of other users are reported as not found.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<i32>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2");
    let task = sqlx::query_as::<_, Task>(&sql)
        .bind(task_id.into_inner())
        .bind(user.user_id)
        .fetch_optional(&**pool)
        .await?;

    task.map(|task| HttpResponse::Ok().json(task))
        .ok_or_else(|| AppError::NotFound("Task not found".into()))
}

/// Updates the fields present in the body; absent fields keep their value.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<i32>,
    task_data: web::Json<TaskUpdate>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let changes = task_data.into_inner();

    let sql = format!(
        "UPDATE tasks
         SET title = COALESCE($1, title),
             description = COALESCE($2, description),
             deadline = COALESCE($3, deadline),
             is_completed = COALESCE($4, is_completed)
         WHERE id = $5 AND user_id = $6
         RETURNING {TASK_COLUMNS}"
    );
    let task = sqlx::query_as::<_, Task>(&sql)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.deadline)
        .bind(changes.is_completed)
        .bind(task_id.into_inner())
        .bind(user.user_id)
        .fetch_optional(&**pool)
        .await?;

    task.map(|task| HttpResponse::Ok().json(task))
        .ok_or_else(|| AppError::NotFound("Task not found".into()))
}

/// Flips the completion flag of a task.
#[patch("/{id}/complete")]
pub async fn toggle_task_completion(
    pool: web::Data<PgPool>,
    task_id: web::Path<i32>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let sql = format!(
        "UPDATE tasks SET is_completed = NOT is_completed
         WHERE id = $1 AND user_id = $2
         RETURNING {TASK_COLUMNS}"
    );
    let task = sqlx::query_as::<_, Task>(&sql)
        .bind(task_id.into_inner())
        .bind(user.user_id)
        .fetch_optional(&**pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    let message = if task.is_completed {
        "Task Marked as Completed"
    } else {
        "Task Marked as Incomplete"
    };
    Ok(HttpResponse::Ok().json(json!({ "message": message, "task": task })))
}

/// Deletes a task owned by the authenticated user.
///
/// ## Responses:
/// - `204 No Content`: On successful deletion.
/// - `404 Not Found`: No such task for this user.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<i32>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
        .bind(task_id.into_inner())
        .bind(user.user_id)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Task not found".into()));
    }

    Ok(HttpResponse::NoContent().finish())
}
