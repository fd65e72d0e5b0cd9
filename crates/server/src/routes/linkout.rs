use axum::{extract::{Path, Query, State}, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use models::external_link;
use service::linkout::domain::{LinkRequest, LinkResponse, MonitoringToolView, SkippedWrite};

use crate::errors::JsonApiError;
use crate::routes::auth::{Claims, ServerState};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct LinksQuery {
    /// 0 or absent lists every link.
    #[serde(default)]
    pub cluster_id: i32,
}

#[derive(Debug, Serialize)]
pub struct UpdateLinkOutput {
    pub link: LinkRequest,
    pub skipped: Vec<SkippedWrite>,
}

#[derive(Debug, Serialize)]
pub struct DeleteLinkOutput {
    pub id: i32,
    pub skipped: Vec<SkippedWrite>,
}

fn validate(req: &LinkRequest) -> Result<(), JsonApiError> {
    external_link::validate_name(&req.name)
        .and_then(|_| external_link::validate_url(&req.url))
        .map_err(|e| JsonApiError::new(StatusCode::BAD_REQUEST, "Validation Error", Some(e.to_string())))
}

#[utoipa::path(
    get, path = "/external-links/tools", tag = "linkout",
    responses((status = 200, description = "Active monitoring tools", body = [crate::openapi::MonitoringToolDoc]), (status = 500, description = "Fetch Failed"))
)]
pub async fn list_tools(State(state): State<ServerState>) -> Result<Json<Vec<MonitoringToolView>>, JsonApiError> {
    Ok(Json(state.linkout.get_all_active_tools().await?))
}

#[utoipa::path(
    get, path = "/external-links", tag = "linkout",
    params(LinksQuery),
    responses((status = 200, description = "Active links", body = [crate::openapi::LinkResponseDoc]), (status = 500, description = "Fetch Failed"))
)]
pub async fn list_links(
    State(state): State<ServerState>,
    Query(q): Query<LinksQuery>,
) -> Result<Json<Vec<LinkResponse>>, JsonApiError> {
    let links = state.linkout.fetch_all_active_links(q.cluster_id).await?;
    info!(cluster_id = q.cluster_id, count = links.len(), "list external links");
    Ok(Json(links))
}

#[utoipa::path(
    post, path = "/external-links", tag = "linkout",
    request_body = [crate::openapi::LinkRequestDoc],
    responses(
        (status = 200, description = "Created"),
        (status = 400, description = "Validation Error"),
        (status = 500, description = "Create Failed")
    )
)]
pub async fn create_links(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    Json(mut input): Json<Vec<LinkRequest>>,
) -> Result<Json<Vec<LinkRequest>>, JsonApiError> {
    for req in input.iter_mut() {
        validate(req)?;
        req.user_id = claims.uid;
    }
    Ok(Json(state.linkout.create(input).await?))
}

#[utoipa::path(
    put, path = "/external-links", tag = "linkout",
    request_body = crate::openapi::LinkRequestDoc,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Not Found"),
        (status = 500, description = "Update Failed")
    )
)]
pub async fn update_link(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    Json(mut input): Json<LinkRequest>,
) -> Result<Json<UpdateLinkOutput>, JsonApiError> {
    validate(&input)?;
    input.user_id = claims.uid;
    let outcome = state.linkout.update(input).await?;
    Ok(Json(UpdateLinkOutput { link: outcome.value, skipped: outcome.skipped }))
}

#[utoipa::path(
    delete, path = "/external-links/{id}", tag = "linkout",
    params(("id" = i32, Path, description = "External link id")),
    responses((status = 200, description = "Deleted"), (status = 404, description = "Not Found"), (status = 500, description = "Delete Failed"))
)]
pub async fn delete_link(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteLinkOutput>, JsonApiError> {
    let outcome = state.linkout.delete_link(id, claims.uid).await?;
    Ok(Json(DeleteLinkOutput { id, skipped: outcome.skipped }))
}
