use std::sync::Arc;

use axum::{extract::{Request, State}, http::StatusCode, middleware::Next, response::Response};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use service::linkout::repo::seaorm::{SeaOrmLinkClusterRepository, SeaOrmLinkRepository, SeaOrmMonitoringToolRepository};
use service::linkout::LinkoutService;
use service::self_registration::domain::SelfRegistration;
use service::self_registration::repo::seaorm::{SeaOrmRoleCatalogRepository, SeaOrmUserProvisioner};
use service::self_registration::SelfRegistrationService;

pub type AppLinkoutService = LinkoutService<SeaOrmLinkRepository, SeaOrmLinkClusterRepository, SeaOrmMonitoringToolRepository>;
pub type AppSelfRegistrationService = SelfRegistrationService<SeaOrmRoleCatalogRepository, SeaOrmUserProvisioner>;

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub jwt_secret: String,
}

#[derive(Clone)]
pub struct ServerState {
    pub auth: ServerAuthConfig,
    pub linkout: Arc<AppLinkoutService>,
    pub self_registration: Arc<AppSelfRegistrationService>,
}

impl ServerState {
    /// Wire the SeaORM repositories over one pooled connection.
    pub fn new(db: DatabaseConnection, auth: ServerAuthConfig) -> Self {
        let linkout = LinkoutService::new(
            Arc::new(SeaOrmLinkRepository { db: db.clone() }),
            Arc::new(SeaOrmLinkClusterRepository { db: db.clone() }),
            Arc::new(SeaOrmMonitoringToolRepository { db: db.clone() }),
        );
        let self_registration = SelfRegistrationService::new(
            Arc::new(SeaOrmRoleCatalogRepository { db: db.clone() }),
            Arc::new(SeaOrmUserProvisioner { db }),
        );
        Self { auth, linkout: Arc::new(linkout), self_registration: Arc::new(self_registration) }
    }
}

/// Verified bearer-token claims, available to handlers as `Extension<Claims>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Caller email.
    pub sub: String,
    /// Application user id; absent for SSO users without an account.
    #[serde(default)]
    pub uid: Option<i32>,
    pub exp: usize,
}

/// Sign `claims` with HS256.
pub fn issue_token(secret: &str, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
    encode(&Header::new(Algorithm::HS256), claims, &EncodingKey::from_secret(secret.as_bytes()))
}

fn is_public(path: &str) -> bool {
    path == "/health"
        || path == "/self-registration/check"
        || path.starts_with("/docs")
        || path.starts_with("/api-docs")
}

/// Global middleware: everything but the public paths needs `Authorization: Bearer <token>`.
/// Missing token is 400, invalid or expired is 401.
pub async fn require_bearer_token_state(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let path = req.uri().path().to_string();
    if is_public(&path) || req.method() == axum::http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let token = match req.headers().get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => {
                warn!(path = %path, "invalid Authorization format (expect Bearer)");
                return Err(StatusCode::UNAUTHORIZED);
            }
        },
        None => {
            warn!(path = %path, "missing Authorization header");
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    let key = DecodingKey::from_secret(state.auth.jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let claims = match decode::<Claims>(&token, &key, &validation) {
        Ok(data) => data.claims,
        Err(e) => {
            error!(path = %path, err = %e, "token validation failed");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    if claims.uid.is_none() {
        // SSO user without an account id; a no-op once the account exists
        let svc = Arc::clone(&state.self_registration);
        let email = claims.sub.clone();
        tokio::spawn(async move {
            if let SelfRegistration::Skipped(reason) = svc.self_register(&email).await {
                debug!(?reason, "self-registration skipped");
            }
        });
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_paths_bypass_authentication() {
        assert!(is_public("/health"));
        assert!(is_public("/self-registration/check"));
        assert!(is_public("/api-docs/openapi.json"));
        assert!(!is_public("/self-registration/roles"));
        assert!(!is_public("/external-links"));
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let exp = (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize;
        let token = issue_token("s3cret", &Claims { sub: "dev@example.com".into(), uid: Some(7), exp }).unwrap();
        let data = decode::<Claims>(&token, &DecodingKey::from_secret(b"s3cret"), &Validation::new(Algorithm::HS256)).unwrap();
        assert_eq!(data.claims.sub, "dev@example.com");
        assert_eq!(data.claims.uid, Some(7));
    }
}
