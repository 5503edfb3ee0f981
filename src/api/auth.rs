//! Authentication routes, cookie or bearer token JWT

use actix_web::cookie::{time::Duration as CookieDuration, Cookie};
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use anyhow::Result as AnyResult;
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::db::{DbEngine, UserTable};
use crate::errors::AppError;
use crate::models::User;
use crate::utils::auth::{
    create_jwt, verify_jwt, verify_password, UserIdentity, ACCESS_TOKEN, ACCESS_TOKEN_TTL,
    REFRESH_TOKEN, REFRESH_TOKEN_TTL,
};

const ACCESS_COOKIE: &str = "access_token_cookie";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct TokenResponse {
    pub msg: String,
    pub accesstoken: String,
    pub refreshtoken: String,
    pub maxage: i64,
}

/// login endpoint
#[post("/login")]
pub async fn login(body: web::Json<LoginRequest>) -> Result<HttpResponse, AppError> {
    let engine = DbEngine::get()?;
    let pool = engine.pool();

    let user = UserTable::get_by_email(pool, &body.email)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid email or password"))?;

    let server_id = ServerConfig::global().read().server_id.clone();

    if !verify_password(&body.password, &user.password, &server_id) {
        return Err(AppError::unauthorized("Invalid email or password"));
    }

    // disabled accounts keep their password but may not log in
    if !user.is_active {
        return Err(AppError::unauthorized("Account is disabled"));
    }

    let tokens = create_tokens(&user, &server_id)?;
    Ok(HttpResponse::Ok()
        .cookie(build_access_cookie(&tokens.accesstoken))
        .json(tokens))
}

/// refresh token, expects refresh token in authorization header
#[post("/refresh")]
pub async fn refresh_token(req: HttpRequest) -> Result<HttpResponse, AppError> {
    let token =
        bearer_token(&req)?.ok_or_else(|| AppError::unauthorized("No token provided"))?;

    let server_id = ServerConfig::global().read().server_id.clone();

    let claims = verify_jwt(&token, &server_id, Some(REFRESH_TOKEN))
        .map_err(|_| AppError::unauthorized("Invalid token"))?;

    // re-check the account; a refresh token must not outlive a disabled user
    let engine = DbEngine::get()?;
    let user = UserTable::get_by_id(engine.pool(), claims.sub.id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::unauthorized("Invalid token"))?;

    let tokens = create_tokens(&user, &server_id)?;
    Ok(HttpResponse::Ok().json(tokens))
}

/// get logged in user
#[get("/user")]
pub async fn get_logged_in_user(req: HttpRequest) -> Result<HttpResponse, AppError> {
    let user = require_user(&req).await?;
    Ok(HttpResponse::Ok().json(user.to_public()))
}

/// logout
#[get("/logout")]
pub async fn logout() -> HttpResponse {
    let cookie = Cookie::build(ACCESS_COOKIE, "")
        .path("/")
        .max_age(CookieDuration::seconds(0))
        .http_only(true)
        .finish();

    HttpResponse::Ok().cookie(cookie).json(serde_json::json!({
        "msg": "Logged out"
    }))
}

// helpers

fn build_access_cookie(token: &str) -> Cookie<'static> {
    Cookie::build(ACCESS_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .max_age(CookieDuration::seconds(ACCESS_TOKEN_TTL as i64))
        .finish()
}

fn user_to_identity(user: &User) -> UserIdentity {
    UserIdentity {
        id: user.id,
        email: user.email.clone(),
        role: user.role,
    }
}

fn create_tokens(user: &User, server_id: &str) -> AnyResult<TokenResponse> {
    let identity = user_to_identity(user);
    let accesstoken = create_jwt(identity.clone(), server_id, ACCESS_TOKEN, ACCESS_TOKEN_TTL)?;
    let refreshtoken = create_jwt(identity, server_id, REFRESH_TOKEN, REFRESH_TOKEN_TTL)?;

    Ok(TokenResponse {
        msg: format!("Logged in as {}", user.email),
        accesstoken,
        refreshtoken,
        maxage: ACCESS_TOKEN_TTL as i64,
    })
}

/// Resolve the requesting user or fail with 401
pub async fn require_user(req: &HttpRequest) -> Result<User, AppError> {
    let token =
        access_token(req)?.ok_or_else(|| AppError::unauthorized("Not authenticated"))?;

    let server_id = ServerConfig::global().read().server_id.clone();

    let claims = verify_jwt(&token, &server_id, Some(ACCESS_TOKEN))
        .map_err(|_| AppError::unauthorized("Invalid token"))?;

    let engine = DbEngine::get()?;
    UserTable::get_by_id(engine.pool(), claims.sub.id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::unauthorized("Invalid token"))
}

/// Resolve the requesting user and fail with 403 unless they are an admin
pub async fn require_admin(req: &HttpRequest) -> Result<User, AppError> {
    let user = require_user(req).await?;
    if user.is_admin() {
        Ok(user)
    } else {
        Err(AppError::Forbidden("Admin access required".to_string()))
    }
}

fn bearer_token(req: &HttpRequest) -> Result<Option<String>, AppError> {
    match req.headers().get("Authorization") {
        Some(header_value) => {
            let header_str = header_value.to_str().unwrap_or("").trim();
            if header_str.is_empty() {
                return Err(AppError::unauthorized("Invalid token format"));
            }

            let token = header_str.strip_prefix("Bearer ").unwrap_or(header_str);
            if token.is_empty() {
                return Err(AppError::unauthorized("Invalid token format"));
            }

            Ok(Some(token.to_string()))
        }
        None => Ok(None),
    }
}

fn access_token(req: &HttpRequest) -> Result<Option<String>, AppError> {
    if let Some(cookie) = req.cookie(ACCESS_COOKIE) {
        return Ok(Some(cookie.value().to_string()));
    }

    bearer_token(req)
}

/// configure auth routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(login)
        .service(refresh_token)
        .service(get_logged_in_user)
        .service(logout);
}
