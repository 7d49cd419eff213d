use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use estate_api::state::{AppState, AppStateInner};
use estate_api::{comments, dashboard, images, reports};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "estate=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("ESTATE_DB_PATH").unwrap_or_else(|_| "estate.db".into());
    let media_dir = std::env::var("ESTATE_MEDIA_DIR").unwrap_or_else(|_| "./media".into());
    let host = std::env::var("ESTATE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("ESTATE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database and media storage
    let db = estate_db::Database::open(&PathBuf::from(&db_path))?;
    let storage = estate_media::Storage::new(PathBuf::from(&media_dir)).await?;

    let state: AppState = Arc::new(AppStateInner { db, storage });

    // Routes
    let app = Router::new()
        .route("/reports", get(reports::list_reports))
        .route("/reports", post(reports::create_report))
        .route("/reports/{report_id}", get(reports::get_report))
        .route("/reports/{report_id}/status", patch(reports::update_status))
        .route("/reports/{report_id}/images", post(images::upload_image))
        .route("/reports/{report_id}/image", put(images::set_cover_image))
        .route("/reports/{report_id}/comments", post(comments::add_comment))
        .route("/media/{image_id}", get(images::download_image))
        .route("/dashboard/summary", get(dashboard::get_summary))
        .route("/violation-types", get(reports::list_violation_types))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Estate portal listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
