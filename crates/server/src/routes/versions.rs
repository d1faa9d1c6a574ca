use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use models::{AppTree, ComponentVersions, EnvironmentTree};

use crate::errors::ApiError;
use crate::json::{JsonPayload, JsonUtf8};
use crate::state::ServerState;

/// Path templates only match non-empty segments (`/app//api` is no route).
fn require_segments(segments: &[&str]) -> Result<(), ApiError> {
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ApiError::NotFound);
    }
    Ok(())
}

/// 返回完整的版本树
pub async fn get_all(State(state): State<ServerState>) -> Result<JsonUtf8<AppTree>, ApiError> {
    Ok(JsonUtf8(state.versions.get_all().await?))
}

pub async fn get_app(
    State(state): State<ServerState>,
    Path(app): Path<String>,
) -> Result<JsonUtf8<EnvironmentTree>, ApiError> {
    require_segments(&[app.as_str()])?;
    Ok(JsonUtf8(state.versions.get_app(&app).await?))
}

pub async fn get_environment(
    State(state): State<ServerState>,
    Path((app, env)): Path<(String, String)>,
) -> Result<JsonUtf8<ComponentVersions>, ApiError> {
    require_segments(&[app.as_str(), env.as_str()])?;
    Ok(JsonUtf8(state.versions.get_environment(&app, &env).await?))
}

/// Bare JSON string; a component that was never written reads as `""`.
pub async fn get_version(
    State(state): State<ServerState>,
    Path((app, env, component)): Path<(String, String, String)>,
) -> Result<JsonUtf8<String>, ApiError> {
    require_segments(&[app.as_str(), env.as_str(), component.as_str()])?;
    let version = state.versions.get_version(&app, &env, &component).await?;
    Ok(JsonUtf8(version.unwrap_or_default()))
}

/// Body: `{app: {env: {component: version}}}`.
pub async fn set_all(
    State(state): State<ServerState>,
    JsonPayload(payload): JsonPayload<AppTree>,
) -> Result<StatusCode, ApiError> {
    if let Some(tree) = payload {
        state.versions.set_all(&tree).await?;
    }
    Ok(StatusCode::OK)
}

/// Body: `{env: {component: version}}`.
pub async fn set_app(
    State(state): State<ServerState>,
    Path(app): Path<String>,
    JsonPayload(payload): JsonPayload<EnvironmentTree>,
) -> Result<StatusCode, ApiError> {
    require_segments(&[app.as_str()])?;
    if let Some(envs) = payload {
        state.versions.set_environments(&app, &envs).await?;
    }
    Ok(StatusCode::OK)
}

/// Body: `{component: version}`.
pub async fn set_environment(
    State(state): State<ServerState>,
    Path((app, env)): Path<(String, String)>,
    JsonPayload(payload): JsonPayload<ComponentVersions>,
) -> Result<StatusCode, ApiError> {
    require_segments(&[app.as_str(), env.as_str()])?;
    if let Some(components) = payload {
        state.versions.set_components(&app, &env, &components).await?;
    }
    Ok(StatusCode::OK)
}

/// Body: a bare JSON string holding the version. An undecodable body
/// stores the empty version.
pub async fn set_version(
    State(state): State<ServerState>,
    Path((app, env, component)): Path<(String, String, String)>,
    JsonPayload(payload): JsonPayload<String>,
) -> Result<StatusCode, ApiError> {
    require_segments(&[app.as_str(), env.as_str(), component.as_str()])?;
    let version = payload.unwrap_or_default();
    state.versions.set_component(&app, &env, &component, &version).await?;
    Ok(StatusCode::OK)
}
