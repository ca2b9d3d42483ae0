use super::routes::{
    get_config_handler, list_windows, post_key, stream_window, update_config_handler,
};
use super::state::AppState;
use super::ui::index_page;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/windows", get(list_windows))
        .route(
            "/config",
            get(get_config_handler).post(update_config_handler),
        )
        .route("/stream/:name", get(stream_window))
        .route("/key/:key", post(post_key))
        .with_state(state)
}

// Binds before returning so a taken port surfaces as an error.
pub async fn run_dashboard_server(state: AppState) -> anyhow::Result<()> {
    let port = state.config.read().await.web.port;
    let app = router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Dashboard listening on http://{}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Serving error: {}", e)
        }
    });

    Ok(())
}
