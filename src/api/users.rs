//! User management routes, admin only

use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::api::auth::require_admin;
use crate::api::PageQuery;
use crate::config::ServerConfig;
use crate::db::{DbEngine, UserTable};
use crate::errors::AppError;
use crate::models::{BulkOutcome, User, UserRole};
use crate::utils::auth::hash_password;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkIdsRequest {
    pub ids: Vec<i64>,
}

#[get("")]
pub async fn list_users(
    req: HttpRequest,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req).await?;
    let engine = DbEngine::get()?;

    let (page, page_size) = query.resolve();
    let users = UserTable::list(engine.pool(), page, page_size).await?;

    let items: Vec<_> = users.items.iter().map(User::to_public).collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "items": items,
        "total": users.total,
    })))
}

#[get("/{id}")]
pub async fn get_user(req: HttpRequest, path: web::Path<i64>) -> Result<HttpResponse, AppError> {
    require_admin(&req).await?;
    let engine = DbEngine::get()?;

    let id = path.into_inner();
    let user = UserTable::get_by_id(engine.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {} not found", id)))?;

    Ok(HttpResponse::Ok().json(user.to_public()))
}

#[post("")]
pub async fn create_user(
    req: HttpRequest,
    body: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req).await?;
    let engine = DbEngine::get()?;

    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let server_id = ServerConfig::global().read().server_id.clone();
    let mut user = User::new(
        body.email.trim().to_string(),
        hash_password(&body.password, &server_id),
    );
    if let Some(role) = body.role {
        user.role = role;
    }

    let id = UserTable::insert(engine.pool(), &user).await?;
    let created = UserTable::get_by_id(engine.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found after insert"))?;

    Ok(HttpResponse::Created().json(created.to_public()))
}

#[put("/{id}")]
pub async fn update_user(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let current = require_admin(&req).await?;
    let engine = DbEngine::get()?;
    let pool = engine.pool();

    let id = path.into_inner();
    let mut user = UserTable::get_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {} not found", id)))?;

    if let Some(email) = body.email.as_ref() {
        if !email.trim().is_empty() {
            user.email = email.trim().to_string();
        }
    }
    if let Some(password) = body.password.as_ref() {
        if !password.is_empty() {
            let server_id = ServerConfig::global().read().server_id.clone();
            user.password = hash_password(password, &server_id);
        }
    }
    if let Some(role) = body.role {
        // an admin demoting themselves could lock the console out entirely
        if current.id == id && role != UserRole::Admin {
            return Err(AppError::Validation(
                "Cannot remove your own admin role".to_string(),
            ));
        }
        user.role = role;
    }
    if let Some(is_active) = body.is_active {
        if current.id == id && !is_active {
            return Err(AppError::Validation(
                "Cannot disable your own account".to_string(),
            ));
        }
        user.is_active = is_active;
    }
    if let Some(is_verified) = body.is_verified {
        user.is_verified = is_verified;
    }

    UserTable::update(pool, &user).await?;
    Ok(HttpResponse::Ok().json(user.to_public()))
}

#[delete("/{id}")]
pub async fn delete_user(req: HttpRequest, path: web::Path<i64>) -> Result<HttpResponse, AppError> {
    let current = require_admin(&req).await?;
    let engine = DbEngine::get()?;

    let id = path.into_inner();
    if current.id == id {
        return Err(AppError::Validation(
            "Cannot delete your own account".to_string(),
        ));
    }

    UserTable::delete(engine.pool(), id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "msg": format!("User {} deleted", id)
    })))
}

/// Delete many users; per-item outcomes, no early abort
#[post("/bulk-delete")]
pub async fn bulk_delete_users(
    req: HttpRequest,
    body: web::Json<BulkIdsRequest>,
) -> Result<HttpResponse, AppError> {
    let current = require_admin(&req).await?;
    let engine = DbEngine::get()?;
    let pool = engine.pool();

    let mut outcome = BulkOutcome::default();
    for &id in &body.ids {
        if id == current.id {
            outcome.record_failure(id, "Cannot delete your own account");
            continue;
        }
        match UserTable::delete(pool, id).await {
            Ok(()) => outcome.record_success(),
            Err(err) => outcome.record_failure(id, err.to_string()),
        }
    }

    Ok(HttpResponse::Ok().json(outcome))
}

/// configure user routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_users)
        .service(get_user)
        .service(create_user)
        .service(update_user)
        .service(delete_user)
        .service(bulk_delete_users);
}
