//! `api` crate — HTTP REST API layer (spec §6).
//!
//! Exposes:
//!   POST   /workflows
//!   GET    /workflows/:id
//!   POST   /workflows/:id/nodes
//!   POST   /workflows/:id/edges
//!   GET    /workflows/:id/edges
//!   POST   /workflows/:id/run
//!   GET    /jobs/:job_id
//!   GET    /workflows/:id/runs
//!   POST   /files

pub mod error;
pub mod handlers;
pub mod state;

use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use db::Repository;
use scheduler::Scheduler;
use services::Services;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

pub async fn serve(
    bind: &str,
    repository: Arc<dyn Repository>,
    scheduler: Scheduler,
    services: Services,
    upload_dir: PathBuf,
) -> Result<(), std::io::Error> {
    let state = AppState { repository, scheduler, services, upload_dir };

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let app = Router::new()
        .route("/workflows", post(handlers::workflows::create_workflow))
        .route("/workflows/:id", get(handlers::workflows::get_workflow))
        .route("/workflows/:id/nodes", post(handlers::workflows::create_node))
        .route("/workflows/:id/edges", get(handlers::workflows::list_edges).post(handlers::workflows::create_edge))
        .route("/workflows/:id/run", post(handlers::jobs::run_workflow))
        .route("/workflows/:id/runs", get(handlers::jobs::list_runs))
        .route("/jobs/:job_id", get(handlers::jobs::get_job))
        .route("/files", post(handlers::files::upload))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await
}
