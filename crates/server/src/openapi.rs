use serde::Serialize;
use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct MonitoringToolDoc { pub id: i32, pub name: String, pub icon: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkRequestDoc {
    pub id: Option<i32>,
    pub name: String,
    pub url: String,
    pub active: Option<bool>,
    pub monitoring_tool_id: i32,
    pub cluster_ids: Vec<i32>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponseDoc {
    pub id: i32,
    pub name: String,
    pub url: String,
    pub active: bool,
    pub monitoring_tool_id: i32,
    /// Empty when the link applies to every cluster.
    pub cluster_ids: Vec<i32>,
}

#[derive(ToSchema)]
pub struct CheckDoc { pub enabled: bool }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::linkout::list_tools,
        crate::routes::linkout::list_links,
        crate::routes::linkout::create_links,
        crate::routes::linkout::update_link,
        crate::routes::linkout::delete_link,
        crate::routes::self_registration::list_roles,
        crate::routes::self_registration::check,
    ),
    components(
        schemas(
            HealthResponse,
            MonitoringToolDoc,
            LinkRequestDoc,
            LinkResponseDoc,
            CheckDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "linkout"),
        (name = "self-registration")
    )
)]
pub struct ApiDoc;
