//! # Hostel Solve Binary
//!
//! The entry point that assembles the application based on compile-time features.

use actix_files::Files;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use hs_api::handlers::AppState;
use hs_api::{configure_routes, middleware};
use hs_config::{LogFormat, LogSettings, Settings};
use hs_core::traits::{AuthProvider, HostelStore};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[cfg(not(any(feature = "db-sqlite", feature = "store-local")))]
compile_error!("enable a storage backend: `db-sqlite` or `store-local`");

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let registry = tracing_subscriber::registry().with(filter);
    match log.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[cfg(feature = "db-sqlite")]
async fn build_store(settings: &Settings) -> anyhow::Result<Box<dyn HostelStore>> {
    use secrecy::ExposeSecret;

    let store = hs_db_sqlite::SqliteStore::new(settings.database.url.expose_secret())
        .await
        .context("opening sqlite database")?;
    if settings.demo_data {
        store.seed_demo_accounts().await?;
    }
    info!("using sqlite store");
    Ok(Box::new(store))
}

#[cfg(all(feature = "store-local", not(feature = "db-sqlite")))]
async fn build_store(settings: &Settings) -> anyhow::Result<Box<dyn HostelStore>> {
    let store = hs_store_local::LocalStore::open(&settings.local_store.root)
        .await
        .context("opening local store")?;
    if settings.demo_data {
        store.seed_demo_issues().await?;
    }
    info!(root = %settings.local_store.root.display(), "using local store");
    Ok(Box::new(store))
}

fn build_auth() -> Box<dyn AuthProvider> {
    #[cfg(feature = "auth-simple")]
    {
        Box::new(hs_auth_simple::SimpleAuthProvider::new())
    }
    #[cfg(not(feature = "auth-simple"))]
    {
        Box::new(hs_core::accounts::PlainTextAuth)
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings.log);
    if let Some(path) = &settings.env_file {
        debug!(path = %path.display(), "loaded .env");
    }

    let state = web::Data::new(AppState {
        store: build_store(&settings).await?,
        auth: build_auth(),
    });

    let (host, port) = settings.bind_address();
    let static_dir = settings.server.static_dir.clone();
    info!(%host, port, "Hostel Solve starting");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::cors_policy())
            .wrap(middleware::security_headers())
            .wrap(middleware::standard_middleware())
            .service(Files::new("/static", &static_dir))
            .configure(configure_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}
