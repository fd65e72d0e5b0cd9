use std::net::SocketAddr;

use axum::Router;
use migration::MigratorTrait;
use reqwest::StatusCode as HttpStatusCode;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use server::routes::{self, auth};

const SECRET: &str = "test-secret";

struct TestApp {
    base_url: String,
}

async fn start_server() -> anyhow::Result<TestApp> {
    // Ensure models prefer env over config file
    std::env::set_var("CONFIG_PATH", "/nonexistent-config-for-tests.toml");

    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL missing; skip e2e tests. Provide .env.test or env var.");
        return Err(anyhow::anyhow!("missing DATABASE_URL"));
    }

    let db = models::db::connect().await?;
    if let Err(e) = migration::Migrator::up(&db, None).await { eprintln!("migrations notice: {}", e); }

    let state = auth::ServerState::new(db, auth::ServerAuthConfig { jwt_secret: SECRET.into() });
    let app: Router = routes::build_router(CorsLayer::very_permissive(), state);
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url })
}

fn bearer(uid: Option<i32>) -> String {
    let exp = (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize;
    let token = auth::issue_token(SECRET, &auth::Claims { sub: format!("e2e_{}@example.com", Uuid::new_v4()), uid, exp })
        .expect("sign token");
    format!("Bearer {}", token)
}

#[tokio::test]
async fn e2e_public_health() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let res = reqwest::get(format!("{}/health", app.base_url)).await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let res = reqwest::get(format!("{}/self-registration/check", app.base_url)).await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert!(res.json::<serde_json::Value>().await?["enabled"].is_boolean());
    Ok(())
}

#[tokio::test]
async fn e2e_link_lifecycle() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let c = reqwest::Client::new();
    let auth = bearer(Some(1));

    let tools: Vec<serde_json::Value> = c
        .get(format!("{}/external-links/tools", app.base_url))
        .header("Authorization", &auth)
        .send().await?
        .json().await?;
    let tool_id = tools.first().and_then(|t| t["id"].as_i64()).expect("seeded tools");

    let cluster = (Uuid::new_v4().as_u128() % 1_000_000) as i64 + 2_000_000;
    let name = format!("e2e_link_{}", Uuid::new_v4());
    let res = c.post(format!("{}/external-links", app.base_url))
        .header("Authorization", &auth)
        .json(&json!([{"name": name, "url": "https://kibana.example.com/app", "monitoringToolId": tool_id, "clusterIds": [cluster]}]))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let listed: Vec<serde_json::Value> = c
        .get(format!("{}/external-links?clusterId={}", app.base_url, cluster))
        .header("Authorization", &auth)
        .send().await?
        .json().await?;
    let entry = listed.iter().find(|l| l["name"] == name.as_str()).expect("link listed for its cluster");
    assert_eq!(entry["clusterIds"], json!([cluster]));
    let id = entry["id"].as_i64().expect("id");

    let res = c.put(format!("{}/external-links", app.base_url))
        .header("Authorization", &auth)
        .json(&json!({"id": id, "name": name, "url": "https://kibana.example.com/app", "active": true, "monitoringToolId": tool_id, "clusterIds": []}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert_eq!(res.json::<serde_json::Value>().await?["skipped"], json!([]));

    // no active cluster left: the link is now listed as global
    let listed: Vec<serde_json::Value> = c
        .get(format!("{}/external-links", app.base_url))
        .header("Authorization", &auth)
        .send().await?
        .json().await?;
    let entry = listed.iter().find(|l| l["id"] == id).expect("global entry");
    assert_eq!(entry["clusterIds"], json!([]));

    let res = c.delete(format!("{}/external-links/{}", app.base_url, id))
        .header("Authorization", &auth)
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let res = c.delete(format!("{}/external-links/{}", app.base_url, i32::MAX))
        .header("Authorization", &auth)
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn e2e_protected_with_expired_token_unauthorized() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let exp = (chrono::Utc::now().timestamp() - 600) as usize;
    let token = auth::issue_token(SECRET, &auth::Claims { sub: "u@example.com".into(), uid: Some(1), exp })?;
    let res = reqwest::Client::new()
        .get(format!("{}/self-registration/roles", app.base_url))
        .header("Authorization", format!("Bearer {}", token))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);
    Ok(())
}
