//! Song routes
//!
//! Inbound payloads pass through the normalization adapter first, so legacy
//! key spellings and duration shapes never reach the table layer.

use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::api::auth::{require_admin, require_user};
use crate::api::PageQuery;
use crate::core::normalize::normalize_song;
use crate::core::{set_featured, FeaturedKind};
use crate::db::{DbEngine, SongTable};
use crate::errors::AppError;
use crate::models::{BulkOutcome, Song, SongStatus};
use crate::stores::{global_cache, CachedKind};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedRequest {
    pub featured: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkIdsRequest {
    pub ids: Vec<i64>,
}

#[get("")]
pub async fn list_songs(
    req: HttpRequest,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    require_user(&req).await?;
    let engine = DbEngine::get()?;
    let cache = global_cache();

    let (page, page_size) = query.resolve();
    if let Some(cached) = cache.get_list(CachedKind::Song, page, page_size) {
        return Ok(HttpResponse::Ok().json(cached));
    }

    let songs = SongTable::list(engine.pool(), page, page_size).await?;
    let body = serde_json::to_value(&songs).map_err(anyhow::Error::from)?;
    cache.put_list(CachedKind::Song, page, page_size, body.clone());

    Ok(HttpResponse::Ok().json(body))
}

#[get("/{id}")]
pub async fn get_song(req: HttpRequest, path: web::Path<i64>) -> Result<HttpResponse, AppError> {
    require_user(&req).await?;
    let engine = DbEngine::get()?;
    let cache = global_cache();

    let id = path.into_inner();
    if let Some(cached) = cache.get_detail(CachedKind::Song, id) {
        return Ok(HttpResponse::Ok().json(cached));
    }

    let song = SongTable::get_by_id(engine.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Song {} not found", id)))?;

    let body = serde_json::to_value(&song).map_err(anyhow::Error::from)?;
    cache.put_detail(CachedKind::Song, id, body.clone());

    Ok(HttpResponse::Ok().json(body))
}

#[post("")]
pub async fn create_song(
    req: HttpRequest,
    body: web::Json<serde_json::Value>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req).await?;
    let engine = DbEngine::get()?;
    let pool = engine.pool();

    let record = normalize_song(&body);

    let title = record
        .get("title")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("Title is required".to_string()))?;
    let artist_id = record
        .get("artist_id")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| AppError::Validation("artistId is required".to_string()))?;

    let mut song = Song::new(title.to_string(), artist_id);
    apply_record(&mut song, &record, &body)?;

    let id = SongTable::insert(pool, &song).await?;
    global_cache().invalidate_kind(CachedKind::Song);

    let created = SongTable::get_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Song not found after insert"))?;

    Ok(HttpResponse::Created().json(created))
}

#[put("/{id}")]
pub async fn update_song(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<serde_json::Value>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req).await?;
    let engine = DbEngine::get()?;
    let pool = engine.pool();

    let id = path.into_inner();
    let mut song = SongTable::get_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Song {} not found", id)))?;

    let record = normalize_song(&body);
    if let Some(title) = record.get("title").and_then(|v| v.as_str()) {
        if !title.trim().is_empty() {
            song.title = title.trim().to_string();
        }
    }
    if let Some(artist_id) = record.get("artist_id").and_then(|v| v.as_i64()) {
        song.artist_id = artist_id;
    }
    apply_record(&mut song, &record, &body)?;

    SongTable::update(pool, &song).await?;
    global_cache().invalidate_entity(CachedKind::Song, id);

    Ok(HttpResponse::Ok().json(song))
}

#[put("/{id}/featured")]
pub async fn set_song_featured(
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
        FeaturedKind::Song,
        id,
        body.featured,
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "msg": format!("Song {} featured={}", id, body.featured)
    })))
}

#[delete("/{id}")]
pub async fn delete_song(req: HttpRequest, path: web::Path<i64>) -> Result<HttpResponse, AppError> {
    require_admin(&req).await?;
    let engine = DbEngine::get()?;

    let id = path.into_inner();
    SongTable::delete(engine.pool(), id).await?;
    global_cache().invalidate_entity(CachedKind::Song, id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "msg": format!("Song {} deleted", id)
    })))
}

/// Delete many songs; per-item outcomes, no early abort
#[post("/bulk-delete")]
pub async fn bulk_delete_songs(
    req: HttpRequest,
    body: web::Json<BulkIdsRequest>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req).await?;
    let engine = DbEngine::get()?;
    let pool = engine.pool();

    let mut outcome = BulkOutcome::default();
    for &id in &body.ids {
        match SongTable::delete(pool, id).await {
            Ok(()) => {
                global_cache().invalidate_entity(CachedKind::Song, id);
                outcome.record_success();
            }
            Err(err) => outcome.record_failure(id, err.to_string()),
        }
    }

    Ok(HttpResponse::Ok().json(outcome))
}

/// Copy the normalized optional fields onto a song.
///
/// The adapter always emits `duration_seconds` (0 when absent), so presence
/// of a duration alias is checked against the raw payload to keep partial
/// updates from zeroing a stored value.
fn apply_record(
    song: &mut Song,
    record: &serde_json::Value,
    raw: &serde_json::Value,
) -> Result<(), AppError> {
    if let Some(featured) = record.get("featured").and_then(|v| v.as_bool()) {
        song.featured = featured;
    }
    if let Some(status) = record.get("status").and_then(|v| v.as_str()) {
        song.status = SongStatus::from_str(status)
            .ok_or_else(|| AppError::Validation(format!("Unknown status '{}'", status)))?;
    }
    let has_duration = ["duration_seconds", "durationSeconds", "duration"]
        .iter()
        .any(|key| raw.get(*key).is_some());
    if has_duration {
        if let Some(duration) = record.get("duration_seconds").and_then(|v| v.as_i64()) {
            song.duration_seconds = duration;
        }
    }
    if let Some(genres) = record.get("genres").and_then(|v| v.as_array()) {
        song.genres = genres
            .iter()
            .filter_map(|g| g.as_str().map(String::from))
            .collect();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalize::normalize_song;

    fn apply(song: &mut Song, raw: serde_json::Value) -> Result<(), AppError> {
        let record = normalize_song(&raw);
        apply_record(song, &record, &raw)
    }

    #[test]
    fn test_partial_update_keeps_stored_duration() {
        let mut song = Song::new("S".into(), 1);
        song.duration_seconds = 215;

        apply(&mut song, serde_json::json!({ "title": "Renamed" })).unwrap();
        assert_eq!(song.duration_seconds, 215);
    }

    #[test]
    fn test_duration_alias_updates_stored_value() {
        let mut song = Song::new("S".into(), 1);
        song.duration_seconds = 215;

        apply(&mut song, serde_json::json!({ "durationSeconds": 180 })).unwrap();
        assert_eq!(song.duration_seconds, 180);
    }

    #[test]
    fn test_garbage_duration_coerces_to_zero_when_present() {
        let mut song = Song::new("S".into(), 1);
        song.duration_seconds = 215;

        apply(&mut song, serde_json::json!({ "duration": "not a number" })).unwrap();
        assert_eq!(song.duration_seconds, 0);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let mut song = Song::new("S".into(), 1);
        let err = apply(&mut song, serde_json::json!({ "status": "vaporized" })).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}

/// configure song routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_songs)
        .service(get_song)
        .service(create_song)
        .service(update_song)
        .service(set_song_featured)
        .service(delete_song)
        .service(bulk_delete_songs);
}
