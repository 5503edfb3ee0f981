//! Playlist routes

use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::api::auth::{require_admin, require_user};
use crate::api::PageQuery;
use crate::core::{set_featured, FeaturedKind};
use crate::db::{DbEngine, PlaylistTable};
use crate::errors::AppError;
use crate::models::Playlist;
use crate::stores::{global_cache, CachedKind};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub owner_user_id: Option<i64>,
    pub artist_id: Option<i64>,
    #[serde(default)]
    pub song_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlaylistRequest {
    pub name: Option<String>,
    pub artist_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceSongsRequest {
    pub song_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedRequest {
    pub featured: bool,
}

#[get("")]
pub async fn list_playlists(
    req: HttpRequest,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    require_user(&req).await?;
    let engine = DbEngine::get()?;
    let cache = global_cache();

    let (page, page_size) = query.resolve();
    if let Some(cached) = cache.get_list(CachedKind::Playlist, page, page_size) {
        return Ok(HttpResponse::Ok().json(cached));
    }

    let playlists = PlaylistTable::list(engine.pool(), page, page_size).await?;
    let body = serde_json::to_value(&playlists).map_err(anyhow::Error::from)?;
    cache.put_list(CachedKind::Playlist, page, page_size, body.clone());

    Ok(HttpResponse::Ok().json(body))
}

#[get("/{id}")]
pub async fn get_playlist(
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_user(&req).await?;
    let engine = DbEngine::get()?;
    let cache = global_cache();

    let id = path.into_inner();
    if let Some(cached) = cache.get_detail(CachedKind::Playlist, id) {
        return Ok(HttpResponse::Ok().json(cached));
    }

    let playlist = PlaylistTable::get_by_id(engine.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Playlist {} not found", id)))?;

    let body = serde_json::to_value(&playlist).map_err(anyhow::Error::from)?;
    cache.put_detail(CachedKind::Playlist, id, body.clone());

    Ok(HttpResponse::Ok().json(body))
}

#[post("")]
pub async fn create_playlist(
    req: HttpRequest,
    body: web::Json<CreatePlaylistRequest>,
) -> Result<HttpResponse, AppError> {
    let current = require_admin(&req).await?;
    let engine = DbEngine::get()?;
    let pool = engine.pool();

    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }

    let owner = body.owner_user_id.unwrap_or(current.id);
    let mut playlist = Playlist::new(name.to_string(), owner);
    playlist.artist_id = body.artist_id;
    playlist.song_ids = body.song_ids.clone();

    let id = PlaylistTable::insert(pool, &playlist).await?;
    global_cache().invalidate_kind(CachedKind::Playlist);

    let created = PlaylistTable::get_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Playlist not found after insert"))?;

    Ok(HttpResponse::Created().json(created))
}

#[put("/{id}")]
pub async fn update_playlist(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdatePlaylistRequest>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req).await?;
    let engine = DbEngine::get()?;
    let pool = engine.pool();

    let id = path.into_inner();
    let mut playlist = PlaylistTable::get_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Playlist {} not found", id)))?;

    if let Some(name) = body.name.as_ref() {
        if !name.trim().is_empty() {
            playlist.name = name.trim().to_string();
        }
    }
    if body.artist_id.is_some() {
        playlist.artist_id = body.artist_id;
    }

    PlaylistTable::update(pool, &playlist).await?;
    global_cache().invalidate_entity(CachedKind::Playlist, id);

    Ok(HttpResponse::Ok().json(playlist))
}

/// Replace the ordered song membership in one shot
#[put("/{id}/songs")]
pub async fn replace_playlist_songs(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<ReplaceSongsRequest>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req).await?;
    let engine = DbEngine::get()?;
    let pool = engine.pool();

    let id = path.into_inner();
    PlaylistTable::update_songs(pool, id, &body.song_ids).await?;
    global_cache().invalidate_entity(CachedKind::Playlist, id);

    let playlist = PlaylistTable::get_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Playlist {} not found", id)))?;

    Ok(HttpResponse::Ok().json(playlist))
}

#[put("/{id}/featured")]
pub async fn set_playlist_featured(
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
        FeaturedKind::Playlist,
        id,
        body.featured,
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "msg": format!("Playlist {} featured={}", id, body.featured)
    })))
}

#[delete("/{id}")]
pub async fn delete_playlist(
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req).await?;
    let engine = DbEngine::get()?;

    let id = path.into_inner();
    PlaylistTable::delete(engine.pool(), id).await?;
    global_cache().invalidate_entity(CachedKind::Playlist, id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "msg": format!("Playlist {} deleted", id)
    })))
}

/// configure playlist routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_playlists)
        .service(get_playlist)
        .service(create_playlist)
        .service(update_playlist)
        .service(replace_playlist_songs)
        .service(set_playlist_featured)
        .service(delete_playlist);
}
