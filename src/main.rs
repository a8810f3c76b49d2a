use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aster_service::api;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aster_service=debug,tower_http=debug,axum=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Code_Aster Command Service");

    // Check if the Code_Aster launcher is available
    let aster_path = std::env::var("ASTER_PATH").unwrap_or_else(|_| {
        // Prefer a repo-local launcher if present
        if Path::new("./bin/as_run").exists() {
            "./bin/as_run".to_string()
        } else {
            "as_run".to_string()
        }
    });

    // The executor runs the launcher from a temp working directory, so
    // relative paths would break. Resolve to an absolute path when possible
    // and export it for the rest of the process.
    let aster_path = std::fs::canonicalize(&aster_path)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or(aster_path);
    std::env::set_var("ASTER_PATH", &aster_path);

    tracing::info!("Using Code_Aster launcher: {}", aster_path);

    // Verify the launcher installation
    match std::process::Command::new(&aster_path)
        .arg("--version")
        .output()
    {
        Ok(_) => tracing::info!("Code_Aster launcher found and accessible"),
        Err(e) => {
            tracing::warn!("Code_Aster launcher not found or not accessible: {}", e);
            tracing::warn!("Set ASTER_PATH environment variable to the correct path");
            tracing::warn!("Service will start but analyses will fail until Code_Aster is available");
        }
    }

    // Build application router
    let app = api::create_router();

    // Bind to address
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8085".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Listening on {}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  /health");
    tracing::info!("  GET  /api/v1/version");
    tracing::info!("  GET  /api/v1/definitions");
    tracing::info!("  GET  /api/v1/definitions/:load_type");
    tracing::info!("  POST /api/v1/validate");
    tracing::info!("  POST /api/v1/generate");
    tracing::info!("  POST /api/v1/comm");
    tracing::info!("  POST /api/v1/analyze");

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
