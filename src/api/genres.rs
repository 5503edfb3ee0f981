//! Genre routes
//!
//! Genres are reference data: deletion is guarded and fails closed when any
//! song still carries the name.

use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::api::auth::{require_admin, require_user};
use crate::api::PageQuery;
use crate::db::{DbEngine, GenreTable};
use crate::errors::AppError;
use crate::models::Genre;
use crate::stores::{global_cache, CachedKind};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGenreRequest {
    pub name: String,
    pub color_hex: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGenreRequest {
    pub name: Option<String>,
    pub color_hex: Option<String>,
    pub description: Option<String>,
}

#[get("")]
pub async fn list_genres(
    req: HttpRequest,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    require_user(&req).await?;
    let engine = DbEngine::get()?;

    let (page, page_size) = query.resolve();
    let genres = GenreTable::list(engine.pool(), page, page_size).await?;

    Ok(HttpResponse::Ok().json(genres))
}

/// Per-genre song counts, for the cleanup screen
#[get("/usage")]
pub async fn genre_usage(req: HttpRequest) -> Result<HttpResponse, AppError> {
    require_user(&req).await?;
    let engine = DbEngine::get()?;

    let usage = GenreTable::usage(engine.pool()).await?;
    Ok(HttpResponse::Ok().json(usage))
}

#[get("/{id}")]
pub async fn get_genre(req: HttpRequest, path: web::Path<i64>) -> Result<HttpResponse, AppError> {
    require_user(&req).await?;
    let engine = DbEngine::get()?;

    let id = path.into_inner();
    let genre = GenreTable::get_by_id(engine.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Genre {} not found", id)))?;

    Ok(HttpResponse::Ok().json(genre))
}

#[post("")]
pub async fn create_genre(
    req: HttpRequest,
    body: web::Json<CreateGenreRequest>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req).await?;
    let engine = DbEngine::get()?;
    let pool = engine.pool();

    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }

    let mut genre = Genre::new(name.to_string());
    if let Some(color) = body.color_hex.as_ref() {
        genre.color_hex = color.clone();
    }
    if let Some(description) = body.description.as_ref() {
        genre.description = description.clone();
    }

    let id = GenreTable::insert(pool, &genre).await?;
    let created = GenreTable::get_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Genre not found after insert"))?;

    Ok(HttpResponse::Created().json(created))
}

#[put("/{id}")]
pub async fn update_genre(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateGenreRequest>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req).await?;
    let engine = DbEngine::get()?;
    let pool = engine.pool();

    let id = path.into_inner();
    let mut genre = GenreTable::get_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Genre {} not found", id)))?;

    if let Some(name) = body.name.as_ref() {
        if !name.trim().is_empty() {
            genre.name = name.trim().to_string();
        }
    }
    if let Some(color) = body.color_hex.as_ref() {
        genre.color_hex = color.clone();
    }
    if let Some(description) = body.description.as_ref() {
        genre.description = description.clone();
    }

    GenreTable::update(pool, &genre).await?;
    Ok(HttpResponse::Ok().json(genre))
}

#[delete("/{id}")]
pub async fn delete_genre(
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req).await?;
    let engine = DbEngine::get()?;

    let id = path.into_inner();
    GenreTable::delete(engine.pool(), id).await?;
    // song views embed genre names
    global_cache().invalidate_kind(CachedKind::Song);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "msg": format!("Genre {} deleted", id)
    })))
}

/// configure genre routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_genres)
        .service(genre_usage)
        .service(get_genre)
        .service(create_genre)
        .service(update_genre)
        .service(delete_genre);
}
