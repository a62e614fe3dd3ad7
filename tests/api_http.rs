// tests/api_http.rs
//
// Drives the router in-process with tower's oneshot; no sockets, no upstreams.

mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::Router;
use http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use city_pulse_fusion::ingest::types::{SourceAdapter, SyncResult};
use city_pulse_fusion::{create_router, AppState, FusionStore, SyncOrchestrator};
use common::{external, Failing, Fixed};

const TOKEN: &str = "test-token";

fn app() -> Router {
    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(Fixed(
            SyncResult::live("google-news-rss", "1 item", "https://news.test")
                .with_news(vec![external("Canal upgrade approved", common::at(0))]),
        )),
        Arc::new(Failing("gistda")),
    ];
    let orchestrator = SyncOrchestrator::new(FusionStore::new(), adapters);
    create_router(AppState::new(orchestrator, TOKEN))
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn admin(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut b = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(t) = token {
        b = b.header("x-admin-token", t);
    }
    b.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn health_reports_ok_before_first_sync() {
    let (status, body) = send(app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["lastSyncAt"].is_null());
}

#[tokio::test]
async fn seed_projects_are_served_and_filterable() {
    let (status, body) = send(app(), get("/api/projects")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (_, body) = send(app(), get("/api/projects?city=phuket")).await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["slug"], "phuket-tourism-mobility-loop");
}

#[tokio::test]
async fn project_lookup_by_slug_and_missing_id() {
    let (status, body) = send(app(), get("/api/projects/khon-kaen-civic-transit")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "project-3");

    let (status, body) = send(app(), get("/api/projects/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn admin_routes_require_token() {
    let (status, _) = send(app(), admin("POST", "/api/admin/sources/sync", None, json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        app(),
        admin("POST", "/api/admin/sources/sync", Some("wrong"), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_sync_runs_cycle_and_updates_reads() {
    let app = app();
    let (status, body) = send(
        app.clone(),
        admin("POST", "/api/admin/sources/sync", Some(TOKEN), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["status"], "live");
    assert_eq!(results[1]["sourceId"], "gistda");
    assert_eq!(results[1]["status"], "stale");
    assert!(body["lastSyncAt"].is_string());

    let (_, news) = send(app.clone(), get("/api/news?kind=external")).await;
    let titles: Vec<&str> = news
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"]["en"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Canal upgrade approved"]);

    let (_, health) = send(app, get("/health")).await;
    assert!(health["lastSyncAt"].is_string());
}

#[tokio::test]
async fn curated_news_is_created_and_survives_sync() {
    let app = app();
    let draft = json!({
        "title": { "th": "ประกาศ", "en": "Official notice" },
        "excerpt": { "th": "รายละเอียด", "en": "Details" }
    });
    let (status, created) = send(
        app.clone(),
        admin("POST", "/api/admin/news", Some(TOKEN), draft),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["kind"], "official");
    let id = created["id"].as_str().unwrap().to_string();

    send(
        app.clone(),
        admin("POST", "/api/admin/sources/sync", Some(TOKEN), json!({})),
    )
    .await;

    let (status, item) = send(app, get(&format!("/api/news/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["title"]["en"], "Official notice");
}

#[tokio::test]
async fn invalid_project_is_rejected() {
    let draft = json!({
        "slug": "bad",
        "title": { "th": "x", "en": "x" },
        "citySlug": "bangkok",
        "domainSlug": "mobility",
        "status": "active",
        "completionPercent": 150,
        "owner": { "th": "o", "en": "o" },
        "summary": { "th": "s", "en": "s" },
        "nextMilestone": { "th": "n", "en": "n" }
    });
    let (status, body) = send(
        app(),
        admin("POST", "/api/admin/projects", Some(TOKEN), draft),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn overview_carries_pulse_metrics() {
    let (status, body) = send(app(), get("/api/overview?city=bangkok&layers=pollution,weather")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selectedCity"], "bangkok");
    assert_eq!(body["activeLayers"], json!(["pollution", "weather"]));
    let ids: Vec<&str> = body["metrics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec!["active-projects", "cities-tracked", "resilience-watch", "data-sources"]
    );
}

#[tokio::test]
async fn configured_app_serves_default_registry_offline() {
    let cfg = city_pulse_fusion::SyncConfig {
        admin_token: TOKEN.into(),
        ..Default::default()
    };
    let (router, orchestrator) = city_pulse_fusion::app(&cfg);

    let (status, body) = send(router.clone(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["lastSyncAt"].is_null());

    let (status, body) = send(
        router.clone(),
        admin("POST", "/api/admin/sources/sync", Some(TOKEN), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), orchestrator.source_ids().len());
    let live: Vec<&str> = results
        .iter()
        .filter(|r| r["status"] == "live")
        .map(|r| r["sourceId"].as_str().unwrap())
        .collect();
    assert_eq!(live, ["time-sync"]);

    let (_, impact) = send(router, get("/api/impact")).await;
    assert_eq!(impact["liveSources"], 1);
}
