use std::{net::SocketAddr, sync::Arc};

use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use checkout_api as api;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    // Init DB
    let db = Arc::new(api::db::establish_connection(&cfg).await?);
    if cfg.auto_migrate {
        api::db::ensure_schema(&db).await?;
    }

    // The gateway client is constructed once here and injected; no global
    // API-key state anywhere.
    let gateway = Arc::new(api::gateway::StripeGateway::new(
        cfg.stripe_api_base.clone(),
        cfg.stripe_secret_key.clone(),
    ));
    let last_orders = Arc::new(api::services::InMemoryLastOrderStore::new());

    let app_state = api::AppState {
        db,
        config: cfg.clone(),
        gateway,
        last_orders,
    };

    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = api::app_router(app_state).layer(cors_layer);

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port).parse()?;
    info!("checkout-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
