//! ElasticsearchAdmin against an in-process fake Elasticsearch node.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use hive2es_core::NodeAddr;
use hive2es_elastic::{AdminOutcome, ElasticSettings, ElasticsearchAdmin, IndexAdmin, IndexLifecycle};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct FakeCluster {
    indices: HashSet<String>,
    aliases: HashSet<(String, String)>,
    settings: HashMap<String, Value>,
    requests: Vec<String>,
    /// How long a force merge takes before answering.
    merge_time: Duration,
}

type Shared = Arc<Mutex<FakeCluster>>;

fn log(state: &Shared, line: String) {
    state.lock().unwrap().requests.push(line);
}

async fn index_exists(State(state): State<Shared>, Path(index): Path<String>) -> StatusCode {
    log(&state, format!("HEAD /{}", index));
    if state.lock().unwrap().indices.contains(&index) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn create_index(
    State(state): State<Shared>,
    Path(index): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    log(&state, format!("PUT /{}", index));
    let mut cluster = state.lock().unwrap();
    if cluster.indices.contains(&index) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"type": "resource_already_exists_exception"}, "status": 400})),
        );
    }
    cluster.indices.insert(index.clone());
    cluster.settings.insert(index, body);
    (StatusCode::OK, Json(json!({"acknowledged": true})))
}

async fn delete_index(State(state): State<Shared>, Path(index): Path<String>) -> StatusCode {
    log(&state, format!("DELETE /{}", index));
    if state.lock().unwrap().indices.remove(&index) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn put_settings(
    State(state): State<Shared>,
    Path(index): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    log(&state, format!("PUT /{}/_settings", index));
    let mut cluster = state.lock().unwrap();
    if !cluster.indices.contains(&index) {
        return StatusCode::NOT_FOUND;
    }
    cluster.settings.insert(format!("{}/_settings", index), body);
    StatusCode::OK
}

async fn refresh(State(state): State<Shared>, Path(index): Path<String>) -> StatusCode {
    log(&state, format!("POST /{}/_refresh", index));
    if state.lock().unwrap().indices.contains(&index) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn forcemerge(State(state): State<Shared>, Path(index): Path<String>) -> StatusCode {
    log(&state, format!("POST /{}/_forcemerge", index));
    let merge_time = state.lock().unwrap().merge_time;
    tokio::time::sleep(merge_time).await;
    if state.lock().unwrap().indices.contains(&index) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn get_alias(
    State(state): State<Shared>,
    Path((index, alias)): Path<(String, String)>,
) -> StatusCode {
    log(&state, format!("GET /{}/_alias/{}", index, alias));
    if state.lock().unwrap().aliases.contains(&(index, alias)) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn update_aliases(State(state): State<Shared>, Json(body): Json<Value>) -> StatusCode {
    log(&state, "POST /_aliases".to_string());
    let mut cluster = state.lock().unwrap();
    let Some(actions) = body["actions"].as_array() else {
        return StatusCode::BAD_REQUEST;
    };
    for action in actions {
        let add = &action["add"];
        let (Some(index), Some(alias)) = (add["index"].as_str(), add["alias"].as_str()) else {
            return StatusCode::BAD_REQUEST;
        };
        if !cluster.indices.contains(index) {
            return StatusCode::NOT_FOUND;
        }
        cluster.aliases.insert((index.to_string(), alias.to_string()));
    }
    StatusCode::OK
}

async fn spawn_fake() -> (SocketAddr, Shared) {
    let state: Shared = Arc::new(Mutex::new(FakeCluster::default()));
    let app = Router::new()
        .route("/_aliases", post(update_aliases))
        .route(
            "/:index",
            get(index_exists).put(create_index).delete(delete_index),
        )
        .route("/:index/_settings", put(put_settings))
        .route("/:index/_refresh", post(refresh))
        .route("/:index/_forcemerge", post(forcemerge))
        .route("/:index/_alias/:alias", get(get_alias))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

fn node(addr: SocketAddr) -> NodeAddr {
    NodeAddr {
        host: addr.ip().to_string(),
        port: addr.port(),
    }
}

fn settings() -> ElasticSettings {
    ElasticSettings {
        request_timeout_ms: 5_000,
        ..ElasticSettings::default()
    }
}

/// A local port nothing listens on.
async fn closed_port() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

#[tokio::test]
async fn test_create_is_idempotent() {
    let (addr, state) = spawn_fake().await;
    let admin = ElasticsearchAdmin::new(&[node(addr)], &settings()).unwrap();

    assert!(!admin.exists("sales").await.unwrap());
    assert_eq!(admin.create("sales", 3).await, AdminOutcome::Success);
    assert!(admin.exists("sales").await.unwrap());
    assert_eq!(admin.create("sales", 3).await, AdminOutcome::AlreadyInState);

    let cluster = state.lock().unwrap();
    let body = &cluster.settings["sales"];
    assert_eq!(body["settings"]["index"]["number_of_shards"], 3);
    assert_eq!(body["settings"]["index"]["number_of_replicas"], 0);
    assert_eq!(body["settings"]["index"]["refresh_interval"], "-1");
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let (addr, _state) = spawn_fake().await;
    let admin = ElasticsearchAdmin::new(&[node(addr)], &settings()).unwrap();

    assert_eq!(admin.delete("sales").await, AdminOutcome::AlreadyInState);
    admin.create("sales", 1).await;
    assert_eq!(admin.delete("sales").await, AdminOutcome::Success);
    assert!(!admin.exists("sales").await.unwrap());
}

#[tokio::test]
async fn test_refresh_restores_refresh_interval() {
    let (addr, state) = spawn_fake().await;
    let admin = ElasticsearchAdmin::new(&[node(addr)], &settings()).unwrap();

    assert!(matches!(admin.refresh("missing").await, AdminOutcome::Error(_)));

    admin.create("sales", 1).await;
    assert_eq!(admin.refresh("sales").await, AdminOutcome::Success);

    let cluster = state.lock().unwrap();
    assert_eq!(cluster.settings["sales/_settings"]["index"]["refresh_interval"], "1s");
    let tail: Vec<&str> = cluster.requests.iter().rev().take(2).map(String::as_str).collect();
    assert_eq!(tail, vec!["POST /sales/_refresh", "PUT /sales/_settings"]);
}

#[tokio::test]
async fn test_alias_and_optimize() {
    let (addr, state) = spawn_fake().await;
    let admin = ElasticsearchAdmin::new(&[node(addr)], &settings()).unwrap();

    admin.create("sales_2020-01-01", 1).await;
    assert_eq!(
        admin.alias("sales_2020-01-01", "sales-alias").await,
        AdminOutcome::Success
    );
    assert_eq!(
        admin.alias("sales_2020-01-01", "sales-alias").await,
        AdminOutcome::AlreadyInState
    );
    assert_eq!(admin.optimize("sales_2020-01-01").await, AdminOutcome::Success);

    let cluster = state.lock().unwrap();
    assert!(cluster
        .aliases
        .contains(&("sales_2020-01-01".to_string(), "sales-alias".to_string())));
    assert!(cluster
        .requests
        .contains(&"POST /sales_2020-01-01/_forcemerge".to_string()));
}

#[tokio::test]
async fn test_fails_over_to_next_node() {
    let dead = closed_port().await;
    let (addr, state) = spawn_fake().await;
    let admin = ElasticsearchAdmin::new(&[node(dead), node(addr)], &settings()).unwrap();

    assert_eq!(admin.create("sales", 1).await, AdminOutcome::Success);
    assert!(state.lock().unwrap().indices.contains("sales"));
}

#[tokio::test]
async fn test_unreachable_cluster_is_non_fatal() {
    let dead = closed_port().await;
    let admin = ElasticsearchAdmin::new(&[node(dead)], &settings()).unwrap();

    assert!(admin.exists("sales").await.is_err());
    assert!(matches!(admin.create("sales", 1).await, AdminOutcome::Error(_)));

    let lifecycle = IndexLifecycle::new(&admin);
    assert!(!lifecycle.exists("sales").await);
    assert!(!lifecycle.delete("sales").await.is_satisfied());
}

#[tokio::test]
async fn test_optimize_outlives_request_timeout() {
    let (addr, state) = spawn_fake().await;
    state.lock().unwrap().merge_time = Duration::from_millis(600);

    let patient = ElasticsearchAdmin::new(
        &[node(addr)],
        &ElasticSettings {
            request_timeout_ms: 200,
            optimize_timeout_ms: 5_000,
            ..ElasticSettings::default()
        },
    )
    .unwrap();
    assert_eq!(patient.create("sales", 1).await, AdminOutcome::Success);
    assert_eq!(patient.optimize("sales").await, AdminOutcome::Success);

    let impatient = ElasticsearchAdmin::new(
        &[node(addr)],
        &ElasticSettings {
            request_timeout_ms: 5_000,
            optimize_timeout_ms: 100,
            ..ElasticSettings::default()
        },
    )
    .unwrap();
    assert!(matches!(impatient.optimize("sales").await, AdminOutcome::Error(_)));
}
