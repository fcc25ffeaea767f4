//! Standalone relying party: discovers the provider, then serves the auth routes.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use oidc_cookie_auth::middleware::{AuthConfig, auth_routes};
use oidc_cookie_auth::{AuthClient, ClientConfig};

/// OpenID Connect login with cookie sessions.
///
/// Provider and cookie settings are read from `OIDC_*` and `COOKIE_*`
/// environment variables.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    let client_config = ClientConfig::from_env().context("invalid OIDC configuration")?;
    let client = AuthClient::discover(client_config)
        .await
        .context("provider discovery failed")?;
    let auth_config = AuthConfig::from_env(client).context("invalid cookie configuration")?;

    let app = auth_routes(auth_config).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    tracing::info!(addr = %args.bind, "Listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize tracing subscriber with environment filter
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("oidc_cookie_auth=info,tower_http=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
