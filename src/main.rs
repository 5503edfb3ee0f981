//! Greenroom - admin console backend for the Greenroom streaming platform

#![allow(dead_code)]

mod api;
mod config;
mod core;
mod db;
mod errors;
mod models;
mod stores;
mod utils;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Greenroom admin console backend
#[derive(Parser, Debug)]
#[command(name = "greenroom")]
#[command(version = "1.0.0")]
#[command(about = "Admin console backend for the Greenroom streaming platform")]
struct Args {
    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 1988)]
    port: u16,

    /// Enable debug mode
    #[arg(long)]
    debug: bool,

    /// Path to config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reset the password for the given account email
    #[arg(long, value_name = "EMAIL")]
    password_reset: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::new(format!("{},sqlx=warn", log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    info!("Greenroom v1.0.0 starting...");

    let paths = config::Paths::init(args.config)?;
    info!("Config directory: {:?}", paths.config_dir());

    if let Some(email) = args.password_reset {
        return password_reset(&email).await;
    }

    start_greenroom(args.host, args.port).await
}

async fn start_greenroom(host: String, port: u16) -> Result<()> {
    info!("Running setup...");
    run_setup().await?;

    let addr = format!("{}:{}", host, port);
    info!("Server listening on http://{}", addr);

    use actix_cors::Cors;
    use actix_web::{middleware, App, HttpServer};

    HttpServer::new(|| {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(api::configure)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}

async fn run_setup() -> Result<()> {
    use crate::config::ServerConfig;
    use crate::db::{run_migrations, setup_sqlite, DbEngine, UserTable};
    use crate::models::User;
    use crate::utils::auth::hash_password;

    // loading generates and persists the server id on first run
    let config = ServerConfig::load()?;

    setup_sqlite().await?;

    let engine = DbEngine::get()?;
    run_migrations(engine.pool()).await?;

    // bootstrap an admin so a fresh install is reachable
    if !UserTable::has_users(engine.pool()).await? {
        let admin = User::admin(
            config.bootstrap_admin_email.clone(),
            hash_password(&config.bootstrap_admin_password, &config.server_id),
        );
        UserTable::insert(engine.pool(), &admin).await?;
        info!("Created bootstrap admin '{}'", admin.email);
    }

    Ok(())
}

/// Reset an account password to a fresh random one and print it
async fn password_reset(email: &str) -> Result<()> {
    use crate::config::ServerConfig;
    use crate::db::{setup_sqlite, DbEngine, UserTable};
    use crate::utils::auth::{generate_random_string, hash_password};

    let config = ServerConfig::load()?;
    setup_sqlite().await?;
    let engine = DbEngine::get()?;

    let mut user = UserTable::get_by_email(engine.pool(), email)
        .await?
        .ok_or_else(|| anyhow::anyhow!("No account with email '{}'", email))?;

    let new_password = generate_random_string(16);
    user.password = hash_password(&new_password, &config.server_id);
    UserTable::update(engine.pool(), &user).await?;

    println!("New password for {}: {}", email, new_password);
    Ok(())
}
