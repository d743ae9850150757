//! COMANDA server entry point.
//!
//! Startup order: logging, config, database connection, schema
//! migrations, optional HQ operator bootstrap, then the HTTP listener
//! with graceful shutdown on Ctrl+C or SIGTERM.

use std::net::SocketAddr;

use comanda_core::error::Error;
use comanda_core::models::hq::CreateHqOperator;
use comanda_core::repository::HqOperatorRepository;
use comanda_db::DbManager;
use comanda_db::repository::SurrealHqOperatorRepository;
use comanda_server::{AppState, HqBootstrap, ServerConfig, build_router};
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tokio::signal::unix::{SignalKind, signal};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("comanda=info".parse().unwrap()),
        )
        .json()
        .init();

    info!("Starting COMANDA server...");

    let config = ServerConfig::load();

    let db = DbManager::connect(&config.db)
        .await
        .expect("Failed to connect to SurrealDB");
    comanda_db::run_migrations(db.client())
        .await
        .expect("Failed to run schema migrations");

    if let Some(bootstrap) = &config.hq_bootstrap {
        bootstrap_hq_operator(&db, &config, bootstrap).await;
    }

    let port = config.port;
    let state = AppState::new(db, config);
    let app = build_router(state);

    let address = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&address)
        .await
        .expect("Failed to bind listener");
    info!("Listening on {address}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    info!("COMANDA server stopped.");
}

/// Create the first HQ operator when it does not exist yet, so a fresh
/// deployment can log in to the console.
async fn bootstrap_hq_operator(db: &DbManager, config: &ServerConfig, bootstrap: &HqBootstrap) {
    let operators = match &config.auth.pepper {
        Some(pepper) => {
            SurrealHqOperatorRepository::with_pepper(db.client().clone(), pepper.clone())
        }
        None => SurrealHqOperatorRepository::new(db.client().clone()),
    };

    match operators.get_by_username(&bootstrap.username).await {
        Ok(_) => {
            info!(username = %bootstrap.username, "HQ bootstrap operator already exists");
        }
        Err(Error::NotFound { .. }) => {
            operators
                .create(CreateHqOperator {
                    username: bootstrap.username.clone(),
                    display_name: bootstrap.username.clone(),
                    password: bootstrap.password.clone(),
                })
                .await
                .expect("Failed to create bootstrap HQ operator");
            info!(username = %bootstrap.username, "Created bootstrap HQ operator");
        }
        Err(err) => panic!("Failed to look up bootstrap HQ operator: {err}"),
    }
}

async fn shutdown_signal() {
    let interrupt = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    tokio::select! {
        _ = interrupt => {},
        _ = terminate => {},
    }
}
