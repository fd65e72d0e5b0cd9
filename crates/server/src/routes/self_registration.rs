use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

#[derive(Debug, Serialize)]
pub struct CheckOutput {
    pub enabled: bool,
}

#[utoipa::path(get, path = "/self-registration/roles", tag = "self-registration", responses((status = 200, description = "Default role names", body = [String]), (status = 500, description = "Fetch Failed")))]
pub async fn list_roles(State(state): State<ServerState>) -> Result<Json<Vec<String>>, JsonApiError> {
    Ok(Json(state.self_registration.get_all().await?))
}

#[utoipa::path(get, path = "/self-registration/check", tag = "self-registration", responses((status = 200, description = "Whether self-registration is enabled", body = crate::openapi::CheckDoc), (status = 500, description = "Fetch Failed")))]
pub async fn check(State(state): State<ServerState>) -> Result<Json<CheckOutput>, JsonApiError> {
    let enabled = state.self_registration.check().await?;
    Ok(Json(CheckOutput { enabled }))
}
