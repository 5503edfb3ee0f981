//! Maintenance routes, admin only
//!
//! Duplicate reconciliation is operator-triggered: scan is a read-only
//! preview, merge applies the scanned groups (or a subset the operator
//! posts back).

use actix_web::{post, web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::api::auth::require_admin;
use crate::core::reconciler::{self, DuplicateGroup};
use crate::db::DbEngine;
use crate::errors::AppError;
use crate::stores::{global_cache, CachedKind};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    /// Groups to merge; when absent the server re-scans and merges everything
    #[serde(default)]
    pub groups: Option<Vec<DuplicateGroup>>,
}

/// Preview duplicate artist groups without mutating anything
#[post("/duplicates/scan")]
pub async fn scan_duplicates(req: HttpRequest) -> Result<HttpResponse, AppError> {
    require_admin(&req).await?;
    let engine = DbEngine::get()?;

    let groups = reconciler::scan(engine.pool()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "groups": groups,
    })))
}

/// Merge duplicate groups, one transaction per group
#[post("/duplicates/merge")]
pub async fn merge_duplicates(
    req: HttpRequest,
    body: web::Json<MergeRequest>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req).await?;
    let engine = DbEngine::get()?;
    let pool = engine.pool();

    let groups = match body.into_inner().groups {
        Some(groups) => groups,
        None => reconciler::scan(pool).await?,
    };

    let report = reconciler::merge_all(pool, &groups).await;

    if report.summary.succeeded > 0 {
        // merges re-point songs and playlists too, drop every derived view
        let cache = global_cache();
        cache.invalidate_kind(CachedKind::Artist);
        cache.invalidate_kind(CachedKind::Song);
        cache.invalidate_kind(CachedKind::Playlist);
    }

    Ok(HttpResponse::Ok().json(report))
}

/// configure maintenance routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(scan_duplicates).service(merge_duplicates);
}
