//! HTTP surface for the items service.
//! Wires `itemstore_core::ItemFacade` into an axum router.

pub mod api;

use api::{
    handle_create_item, handle_delete_item, handle_get_item, handle_health, handle_list_items,
};
use axum::extract::Extension;
use axum::routing::get;
use axum::Router;
use itemstore_core::ItemFacade;
use log::info;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

/// Builds the router for `/health` and `/items`.
///
/// Cross-origin requests are allowed from any origin, with any method and
/// header, credentials included. Origin, methods and headers are mirrored
/// from the request since wildcards cannot be combined with credentials.
pub fn router(facade: Arc<ItemFacade>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/items", get(handle_list_items).post(handle_create_item))
        .route("/items/:id", get(handle_get_item).delete(handle_delete_item))
        .layer(Extension(facade))
        .layer(CorsLayer::very_permissive())
}

/// Serves the router on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    facade: Arc<ItemFacade>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let local_addr = listener
        .local_addr()
        .map_or_else(|_| "unknown".to_string(), |addr| addr.to_string());
    info!(
        "event=http_start module=server status=ok addr={} storage_mode={}",
        local_addr,
        facade.mode().as_str()
    );

    axum::serve(listener, router(facade))
        .with_graceful_shutdown(shutdown)
        .await
}
