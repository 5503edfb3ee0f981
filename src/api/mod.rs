//! REST API routes for Greenroom

pub mod artists;
pub mod auth;
pub mod featured;
pub mod genres;
pub mod maintenance;
pub mod playlists;
pub mod songs;
pub mod users;

use actix_web::web;
use serde::Deserialize;

use crate::config::ServerConfig;

/// Pagination query shared by every list endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<i64>,
    /// Accepted as both `pageSize` and the legacy `page_size`
    #[serde(alias = "page_size")]
    pub page_size: Option<i64>,
}

impl PageQuery {
    /// Resolve to a 1-based page and a clamped page size
    pub fn resolve(&self) -> (i64, i64) {
        let page = self.page.filter(|p| *p > 0).unwrap_or(1);
        let page_size = ServerConfig::global().read().clamp_page_size(self.page_size);
        (page, page_size)
    }
}

/// Configure all API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/auth").configure(auth::configure))
        .service(web::scope("/users").configure(users::configure))
        .service(web::scope("/artists").configure(artists::configure))
        .service(web::scope("/songs").configure(songs::configure))
        .service(web::scope("/playlists").configure(playlists::configure))
        .service(web::scope("/genres").configure(genres::configure))
        .service(web::scope("/featured").configure(featured::configure))
        .service(web::scope("/maintenance").configure(maintenance::configure));
}
