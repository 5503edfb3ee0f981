//! Artist routes
//!
//! Creation runs through the identity resolver so the console flags an
//! existing spelling of the same name before a duplicate row is born. The
//! `/resolve` endpoint exposes the same check as a dry run for form
//! validation.

use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::api::auth::{require_admin, require_user};
use crate::api::PageQuery;
use crate::core::identity::resolve_artist_name;
use crate::core::normalize::normalize_artist;
use crate::core::{set_featured, FeaturedKind};
use crate::db::{ArtistTable, DbEngine};
use crate::errors::AppError;
use crate::models::Artist;
use crate::stores::{global_cache, CachedKind};

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedRequest {
    pub featured: bool,
}

#[get("")]
pub async fn list_artists(
    req: HttpRequest,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    require_user(&req).await?;
    let engine = DbEngine::get()?;
    let cache = global_cache();

    let (page, page_size) = query.resolve();
    if let Some(cached) = cache.get_list(CachedKind::Artist, page, page_size) {
        return Ok(HttpResponse::Ok().json(cached));
    }

    let artists = ArtistTable::list(engine.pool(), page, page_size).await?;
    let body = serde_json::to_value(&artists).map_err(anyhow::Error::from)?;
    cache.put_list(CachedKind::Artist, page, page_size, body.clone());

    Ok(HttpResponse::Ok().json(body))
}

/// Dry-run identity check: does this name already exist in any spelling?
#[get("/resolve")]
pub async fn resolve_artist(
    req: HttpRequest,
    query: web::Query<ResolveQuery>,
) -> Result<HttpResponse, AppError> {
    require_user(&req).await?;
    let engine = DbEngine::get()?;

    let check = resolve_artist_name(engine.pool(), &query.name).await;
    Ok(HttpResponse::Ok().json(check))
}

#[get("/{id}")]
pub async fn get_artist(req: HttpRequest, path: web::Path<i64>) -> Result<HttpResponse, AppError> {
    require_user(&req).await?;
    let engine = DbEngine::get()?;
    let cache = global_cache();

    let id = path.into_inner();
    if let Some(cached) = cache.get_detail(CachedKind::Artist, id) {
        return Ok(HttpResponse::Ok().json(cached));
    }

    let artist = ArtistTable::get_by_id(engine.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Artist {} not found", id)))?;

    let body = serde_json::to_value(&artist).map_err(anyhow::Error::from)?;
    cache.put_detail(CachedKind::Artist, id, body.clone());

    Ok(HttpResponse::Ok().json(body))
}

#[post("")]
pub async fn create_artist(
    req: HttpRequest,
    body: web::Json<serde_json::Value>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req).await?;
    let engine = DbEngine::get()?;
    let pool = engine.pool();

    let record = normalize_artist(&body);
    let stage_name = record
        .get("stage_name")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("Stage name is required".to_string()))?;

    // the resolver fails open: a resolution outage never blocks creation
    let check = resolve_artist_name(pool, stage_name).await;
    if check.is_duplicate {
        return Err(AppError::conflict(format!(
            "Artist '{}' already exists as id {}",
            stage_name,
            check.matched_id.unwrap_or_default()
        )));
    }

    let mut artist = Artist::new(stage_name.to_string());
    artist.owner_user_id = record.get("owner_user_id").and_then(|v| v.as_i64());

    let id = ArtistTable::insert(pool, &artist).await?;
    global_cache().invalidate_kind(CachedKind::Artist);

    let created = ArtistTable::get_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Artist not found after insert"))?;

    Ok(HttpResponse::Created().json(created))
}

#[put("/{id}")]
pub async fn update_artist(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<serde_json::Value>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req).await?;
    let engine = DbEngine::get()?;
    let pool = engine.pool();

    let id = path.into_inner();
    let mut artist = ArtistTable::get_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Artist {} not found", id)))?;

    let record = normalize_artist(&body);
    if let Some(name) = record.get("stage_name").and_then(|v| v.as_str()) {
        if !name.trim().is_empty() {
            artist.stage_name = name.trim().to_string();
        }
    }
    if let Some(owner) = record.get("owner_user_id") {
        artist.owner_user_id = owner.as_i64();
    }

    ArtistTable::update(pool, &artist).await?;
    global_cache().invalidate_entity(CachedKind::Artist, id);

    Ok(HttpResponse::Ok().json(artist))
}

/// Toggle the featured flag. This is the only artist-featured write path.
#[put("/{id}/featured")]
pub async fn set_artist_featured(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<FeaturedRequest>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req).await?;
    let engine = DbEngine::get()?;

    let id = path.into_inner();
    set_featured(
        engine.pool(),
        global_cache(),
        FeaturedKind::Artist,
        id,
        body.featured,
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "msg": format!("Artist {} featured={}", id, body.featured)
    })))
}

#[delete("/{id}")]
pub async fn delete_artist(
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req).await?;
    let engine = DbEngine::get()?;

    let id = path.into_inner();
    ArtistTable::delete(engine.pool(), id).await?;
    global_cache().invalidate_entity(CachedKind::Artist, id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "msg": format!("Artist {} deleted", id)
    })))
}

/// configure artist routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_artists)
        .service(resolve_artist)
        .service(get_artist)
        .service(create_artist)
        .service(update_artist)
        .service(set_artist_featured)
        .service(delete_artist);
}
