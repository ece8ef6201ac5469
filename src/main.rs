use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use vpn_pki::authority::CertificateAuthority;
use vpn_pki::config::{PkiConfig, ServerConfig};
use vpn_pki::http::auth::StaticTokenAuthenticator;
use vpn_pki::http::{AppState, build_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vpn_pki=info,tower_http=info")),
        )
        .init();

    // Load .env file if present (non-fatal if missing).
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("no .env file loaded: {e}");
    }

    let pki_config = PkiConfig::from_env();
    let server_config = ServerConfig::from_env();
    tracing::info!(
        pki_dir = %pki_config.root.display(),
        workers = pki_config.workers,
        port = server_config.port,
        "configuration loaded"
    );
    if server_config.api_token.is_none() {
        tracing::warn!("PKI_API_TOKEN not set, signing is disabled");
    }

    // The CA must be ready before any request is served.
    let authority = Arc::new(CertificateAuthority::from_config(&pki_config));
    match authority.bootstrap(pki_config.ca_subject.clone()).await {
        Ok(ca) => tracing::info!(serial = %ca.certificate().serial_hex(), "CA ready"),
        Err(e) => {
            tracing::error!(error = %e, "failed to bootstrap CA");
            std::process::exit(1);
        }
    }

    let state = Arc::new(AppState {
        authority,
        authenticator: Arc::new(StaticTokenAuthenticator::new(server_config.api_token)),
    });
    let router = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], server_config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind HTTP listener");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "HTTP listener started");

    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "HTTP server error");
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
