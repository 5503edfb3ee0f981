//! Featured curation read model
//!
//! One endpoint the console landing page polls. Song and playlist sections
//! are curated by toggles; the artist section is derived the same way but
//! has no write path here, artists are toggled via their own route.

use actix_web::{get, web, HttpRequest, HttpResponse};

use crate::api::auth::require_user;
use crate::db::{ArtistTable, DbEngine, PlaylistTable, SongTable};
use crate::errors::AppError;
use crate::stores::{global_cache, CachedKind};

#[get("")]
pub async fn get_featured(req: HttpRequest) -> Result<HttpResponse, AppError> {
    require_user(&req).await?;
    let engine = DbEngine::get()?;
    let pool = engine.pool();
    let cache = global_cache();

    let songs = match cache.get_featured(CachedKind::Song) {
        Some(cached) => cached,
        None => {
            let songs = SongTable::featured(pool).await?;
            let value = serde_json::to_value(&songs).map_err(anyhow::Error::from)?;
            cache.put_featured(CachedKind::Song, value.clone());
            value
        }
    };

    let artists = match cache.get_featured(CachedKind::Artist) {
        Some(cached) => cached,
        None => {
            let artists = ArtistTable::featured(pool).await?;
            let value = serde_json::to_value(&artists).map_err(anyhow::Error::from)?;
            cache.put_featured(CachedKind::Artist, value.clone());
            value
        }
    };

    let playlists = match cache.get_featured(CachedKind::Playlist) {
        Some(cached) => cached,
        None => {
            let playlists = PlaylistTable::featured(pool).await?;
            let value = serde_json::to_value(&playlists).map_err(anyhow::Error::from)?;
            cache.put_featured(CachedKind::Playlist, value.clone());
            value
        }
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "songs": songs,
        "artists": artists,
        "playlists": playlists,
    })))
}

/// configure featured routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_featured);
}
