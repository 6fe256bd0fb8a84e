//! SSR host for the merchant portal.

mod config;
mod routes;

use config::{HostConfig, HostError};

#[tokio::main]
async fn main() -> Result<(), HostError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = HostConfig::from_env()?;
    tracing::info!(
        default_locale = %config.portal.default_locale,
        login_path = %config.portal.login_path,
        "portal config loaded"
    );
    if config.portal.firebase.project_id.is_empty() {
        tracing::warn!("PORTAL_FIREBASE_PROJECT_ID not set; unread counts will report errors");
    }

    let app = routes::app()?;
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(%addr, "merchant portal listening");
    axum::serve(listener, app).await?;
    Ok(())
}
