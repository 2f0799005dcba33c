use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub mod actions;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use config::ServerConfig;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let app_state = AppState::new(&config.jwt_secret, &config.session);
    let app = routes::app(app_state);

    let listener = TcpListener::bind(&config.bind_address).await?;
    info!(
        "Game server listening on {} (turn timer {}s, K={})",
        config.bind_address,
        config.session.turn_timer.as_secs(),
        config.session.k_factor
    );
    axum::serve(listener, app).await?;
    Ok(())
}
