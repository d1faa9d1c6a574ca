use axum::{routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::ServerState;

pub mod versions;

/// Build the application router.
///
/// Four path templates, each answering GET (read) and POST (write). Anything
/// else is unmatched and gets axum's empty 404 (405 for a wrong method).
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(versions::get_all).post(versions::set_all))
        .route("/:app", get(versions::get_app).post(versions::set_app))
        .route("/:app/:env", get(versions::get_environment).post(versions::set_environment))
        .route(
            "/:app/:env/:component",
            get(versions::get_version).post(versions::set_version),
        )
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径，日志级别为 INFO
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx 以 ERROR 记录
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
