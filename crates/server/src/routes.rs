use axum::{
    middleware,
    routing::{delete, get},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::openapi::ApiDoc;

pub mod auth;
pub mod linkout;
pub mod self_registration;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: public routes, the linkout API and self-registration.
pub fn build_router(cors: CorsLayer, state: auth::ServerState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/self-registration/check", get(self_registration::check))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let api = Router::new()
        .route("/external-links/tools", get(linkout::list_tools))
        .route(
            "/external-links",
            get(linkout::list_links).post(linkout::create_links).put(linkout::update_link),
        )
        .route("/external-links/:id", delete(linkout::delete_link))
        .route("/self-registration/roles", get(self_registration::list_roles));

    public
        .merge(api)
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer_token_state))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one INFO span per request with method and path
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // status and latency
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use sea_orm::DatabaseConnection;
    use tower::ServiceExt;

    const SECRET: &str = "test-secret";

    // routes that reach storage fail, which is enough to observe the auth layer
    fn app() -> Router {
        let state = auth::ServerState::new(
            DatabaseConnection::Disconnected,
            auth::ServerAuthConfig { jwt_secret: SECRET.into() },
        );
        build_router(CorsLayer::very_permissive(), state)
    }

    fn token(uid: Option<i32>, exp_offset_secs: i64) -> String {
        let exp = (chrono::Utc::now().timestamp() + exp_offset_secs) as usize;
        auth::issue_token(SECRET, &auth::Claims { sub: "dev@example.com".into(), uid, exp }).unwrap()
    }

    async fn get(uri: &str, bearer: Option<String>) -> axum::response::Response {
        let mut req = Request::builder().method("GET").uri(uri);
        if let Some(t) = bearer {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", t));
        }
        app().oneshot(req.body(Body::empty()).unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let res = get("/health", None).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["status"], "ok");
    }

    #[tokio::test]
    async fn openapi_document_lists_linkout_paths() {
        let res = get("/api-docs/openapi.json", None).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(v["paths"]["/external-links"].is_object());
        assert!(v["paths"]["/self-registration/check"].is_object());
    }

    #[tokio::test]
    async fn missing_token_is_bad_request() {
        assert_eq!(get("/external-links", None).await.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_authorization_is_unauthorized() {
        let req = Request::builder()
            .uri("/external-links/tools")
            .header(header::AUTHORIZATION, "Basic abc")
            .body(Body::empty())
            .unwrap();
        assert_eq!(app().oneshot(req).await.unwrap().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() {
        let res = get("/self-registration/roles", Some(token(Some(1), -120))).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn storage_failure_hides_raw_cause_from_error_message() {
        let res = get("/external-links?clusterId=3", Some(token(Some(1), 3600))).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["error"], "storage failure");
        assert!(v["detail"].is_string());
    }

    #[tokio::test]
    async fn create_rejects_blank_url_before_storage() {
        let req = Request::builder()
            .method("POST")
            .uri("/external-links")
            .header(header::AUTHORIZATION, format!("Bearer {}", token(Some(1), 3600)))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"[{"name":"grafana","url":" ","monitoringToolId":1,"clusterIds":[1]}]"#))
            .unwrap();
        let res = app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
