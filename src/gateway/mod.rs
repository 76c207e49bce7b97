pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::jwt_auth_middleware;
use crate::websocket::ws_handler;
use state::AppState;

/// Build the HTTP + WebSocket router
pub fn router(state: Arc<AppState>) -> Router {
    // JWT-protected payment routes
    let payment_routes = Router::new()
        .route("/send", post(handlers::send_payment))
        .route("/balance/{user_id}", get(handlers::get_balance))
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/health", get(handlers::health_check))
        .nest("/api/payments", payment_routes)
        .with_state(state)
        // Stateless, added after with_state
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Serve until `shutdown` resolves, then drop every live push channel.
pub async fn run_server<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let directory = state.directory.clone();
    let app = router(state);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            // Closing the channels lets open sockets finish their send loops
            directory.clear();
        })
        .await;

    if let Err(e) = &result {
        tracing::error!(error = %e, "Server error");
    }
    result
}
