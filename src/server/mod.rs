//! JSON API server for prospect listing and tagging.
//!
//! Routes:
//! - `GET /healthz`
//! - `POST /api/enqueue_enrichment`, `POST /api/tag_outreach_ready`
//! - `GET /api/prospects`, `GET /api/list-options`

mod handlers;
mod routes;

pub use handlers::validation;
pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::repository::ProspectStore;
use crate::services::{ListTagDefaults, ProspectLister, TaggingService};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProspectStore>,
    pub lister: ProspectLister,
    pub tagging: TaggingService,
}

impl AppState {
    pub fn new(store: Arc<dyn ProspectStore>, defaults: ListTagDefaults) -> Self {
        Self {
            lister: ProspectLister::new(store.clone()),
            tagging: TaggingService::new(store.clone(), defaults),
            store,
        }
    }
}

/// Start the web server.
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
