use axum::Router;
use configs::AppConfig;
use service::storage;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes;
use crate::state::ServerState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Public entry: open the backend, build the app and serve until the process is stopped.
pub async fn run(cfg: AppConfig) -> Result<(), StartupError> {
    // 存储句柄只在这里创建一次，之后通过 state 注入
    let store = storage::open_backend(&cfg).await?;
    let state = ServerState::new(store);

    let app: Router = routes::build_router(state, build_cors());

    let addr = cfg.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind { addr: addr.clone(), source })?;
    info!(%addr, event = "listening", "Listening on {addr}");
    axum::serve(listener, app).await.map_err(StartupError::Serve)?;
    Ok(())
}
