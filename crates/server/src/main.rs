use std::net::SocketAddr;

use server_api::{seed::seed_demo_content, ApiContext, AuthConfig};
use storage::Storage;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod config;

use config::{load_settings, prepare_database_url};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let api = ApiContext::new(
        storage,
        AuthConfig {
            jwt_secret: settings.jwt_secret,
            token_ttl_seconds: settings.token_ttl_seconds,
        },
    );

    if settings.seed_demo {
        let created = seed_demo_content(&api).await?;
        info!(created, "demo seed finished");
    }

    let app = api::build_router(api);
    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "blog server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
