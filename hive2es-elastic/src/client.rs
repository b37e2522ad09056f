//! reqwest-backed `IndexAdmin` talking to the Elasticsearch REST API.

use crate::admin::{AdminOutcome, IndexAdmin};
use async_trait::async_trait;
use hive2es_core::{ElasticError, IndexTarget, NodeAddr};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Connection settings for the administrative client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ElasticSettings {
    /// `http` or `https`
    pub scheme: String,
    pub request_timeout_ms: u64,
    /// Force merges block until the index is down to one segment, which on
    /// a large index takes far longer than any other call.
    pub optimize_timeout_ms: u64,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for ElasticSettings {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            request_timeout_ms: 60_000,
            optimize_timeout_ms: 3_600_000,
            username: None,
            password: None,
        }
    }
}

/// A raw answer from a node.
#[derive(Debug, Clone)]
pub struct NodeResponse {
    pub status: StatusCode,
    pub body: String,
}

pub struct ElasticsearchAdmin {
    client: reqwest::Client,
    base_urls: Vec<String>,
    credentials: Option<(String, Option<String>)>,
    optimize_timeout: Duration,
    /// Node that answered last; requests start there.
    preferred: AtomicUsize,
}

impl ElasticsearchAdmin {
    pub fn new(nodes: &[NodeAddr], settings: &ElasticSettings) -> Result<Self, ElasticError> {
        if nodes.is_empty() {
            return Err(ElasticError::NoNodes);
        }
        if settings.scheme != "http" && settings.scheme != "https" {
            return Err(ElasticError::Client {
                reason: format!("unsupported scheme '{}'", settings.scheme),
            });
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .build()
            .map_err(|e| ElasticError::Client {
                reason: e.to_string(),
            })?;
        let base_urls = nodes
            .iter()
            .map(|n| format!("{}://{}", settings.scheme, n))
            .collect();
        let credentials = settings
            .username
            .clone()
            .map(|user| (user, settings.password.clone()));
        Ok(Self {
            client,
            base_urls,
            credentials,
            optimize_timeout: Duration::from_millis(settings.optimize_timeout_ms),
            preferred: AtomicUsize::new(0),
        })
    }

    pub fn base_urls(&self) -> &[String] {
        &self.base_urls
    }

    /// Send a request, failing over to the next node on transport errors.
    /// Any HTTP answer, including errors, ends the failover.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<NodeResponse, ElasticError> {
        self.send_with_timeout(method, path, body, None).await
    }

    /// [`send`](Self::send) with a per-request timeout replacing the
    /// client-wide one.
    pub async fn send_with_timeout(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        timeout: Option<Duration>,
    ) -> Result<NodeResponse, ElasticError> {
        let count = self.base_urls.len();
        let start = self.preferred.load(Ordering::Relaxed) % count;
        let mut last_error = ElasticError::NoNodes;

        for offset in 0..count {
            let idx = (start + offset) % count;
            let url = format!("{}{}", self.base_urls[idx], path);
            let mut request = self.client.request(method.clone(), &url);
            if let Some((user, password)) = &self.credentials {
                request = request.basic_auth(user, password.as_ref());
            }
            if let Some(body) = body {
                request = request.json(body);
            }
            if let Some(timeout) = timeout {
                request = request.timeout(timeout);
            }

            match request.send().await {
                Ok(response) => {
                    self.preferred.store(idx, Ordering::Relaxed);
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    tracing::trace!(%method, %url, %status, "Elasticsearch answered");
                    return Ok(NodeResponse { status, body });
                }
                Err(err) => {
                    tracing::warn!(node = %self.base_urls[idx], error = %err, "Elasticsearch node unreachable");
                    last_error = ElasticError::Transport {
                        node: self.base_urls[idx].clone(),
                        reason: err.to_string(),
                    };
                }
            }
        }
        Err(last_error)
    }

    async fn outcome(
        &self,
        operation: &str,
        index: &str,
        method: Method,
        path: &str,
        body: Option<&Value>,
        classify: fn(&NodeResponse) -> Option<AdminOutcome>,
    ) -> AdminOutcome {
        classified(operation, index, self.send(method, path, body).await, classify)
    }
}

fn classified(
    operation: &str,
    index: &str,
    result: Result<NodeResponse, ElasticError>,
    classify: fn(&NodeResponse) -> Option<AdminOutcome>,
) -> AdminOutcome {
    match result {
        Ok(response) => classify(&response).unwrap_or_else(|| {
            AdminOutcome::from(ElasticError::Status {
                operation: operation.to_string(),
                index: index.to_string(),
                status: response.status.as_u16(),
                body: response.body,
            })
        }),
        Err(err) => err.into(),
    }
}

// ============================================================================
// REQUEST BODIES AND STATUS CLASSIFICATION
// ============================================================================

/// Settings for a freshly created bulk-load index.
pub fn create_body(shards: u32) -> Value {
    json!({
        "settings": {
            "index": {
                "number_of_shards": shards,
                "number_of_replicas": IndexTarget::REPLICAS,
                "refresh_interval": IndexTarget::LOAD_REFRESH_INTERVAL,
            }
        }
    })
}

pub fn serving_settings_body() -> Value {
    json!({
        "index": {
            "refresh_interval": IndexTarget::SERVING_REFRESH_INTERVAL,
        }
    })
}

pub fn alias_body(index: &str, alias: &str) -> Value {
    json!({
        "actions": [
            { "add": { "index": index, "alias": alias } }
        ]
    })
}

fn success(response: &NodeResponse) -> Option<AdminOutcome> {
    response
        .status
        .is_success()
        .then_some(AdminOutcome::Success)
}

/// 400 `resource_already_exists_exception` (`index_already_exists_exception`
/// before 6.x) means the index is already there.
pub fn classify_create(response: &NodeResponse) -> Option<AdminOutcome> {
    if response.status == StatusCode::BAD_REQUEST
        && (response.body.contains("resource_already_exists_exception")
            || response.body.contains("index_already_exists_exception"))
    {
        return Some(AdminOutcome::AlreadyInState);
    }
    success(response)
}

/// 404 on delete means there was nothing to delete.
pub fn classify_delete(response: &NodeResponse) -> Option<AdminOutcome> {
    if response.status == StatusCode::NOT_FOUND {
        return Some(AdminOutcome::AlreadyInState);
    }
    success(response)
}

pub fn classify_plain(response: &NodeResponse) -> Option<AdminOutcome> {
    success(response)
}

#[async_trait]
impl IndexAdmin for ElasticsearchAdmin {
    async fn exists(&self, index: &str) -> Result<bool, ElasticError> {
        let response = self.send(Method::HEAD, &format!("/{}", index), None).await?;
        match response.status {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(ElasticError::Status {
                operation: "exists".to_string(),
                index: index.to_string(),
                status: status.as_u16(),
                body: response.body,
            }),
        }
    }

    async fn create(&self, index: &str, shards: u32) -> AdminOutcome {
        let body = create_body(shards);
        self.outcome(
            "create",
            index,
            Method::PUT,
            &format!("/{}", index),
            Some(&body),
            classify_create,
        )
        .await
    }

    async fn delete(&self, index: &str) -> AdminOutcome {
        self.outcome(
            "delete",
            index,
            Method::DELETE,
            &format!("/{}", index),
            None,
            classify_delete,
        )
        .await
    }

    async fn refresh(&self, index: &str) -> AdminOutcome {
        let settings = serving_settings_body();
        let restored = self
            .outcome(
                "refresh settings",
                index,
                Method::PUT,
                &format!("/{}/_settings", index),
                Some(&settings),
                classify_plain,
            )
            .await;
        if !restored.is_satisfied() {
            return restored;
        }
        self.outcome(
            "refresh",
            index,
            Method::POST,
            &format!("/{}/_refresh", index),
            None,
            classify_plain,
        )
        .await
    }

    async fn alias(&self, index: &str, alias: &str) -> AdminOutcome {
        match self
            .send(Method::GET, &format!("/{}/_alias/{}", index, alias), None)
            .await
        {
            Ok(response) if response.status.is_success() => return AdminOutcome::AlreadyInState,
            Ok(_) => {}
            Err(err) => return err.into(),
        }
        let body = alias_body(index, alias);
        self.outcome(
            "alias",
            index,
            Method::POST,
            "/_aliases",
            Some(&body),
            classify_plain,
        )
        .await
    }

    async fn optimize(&self, index: &str) -> AdminOutcome {
        let result = self
            .send_with_timeout(
                Method::POST,
                &format!("/{}/_forcemerge?max_num_segments=1", index),
                None,
                Some(self.optimize_timeout),
            )
            .await;
        classified("optimize", index, result, classify_plain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> NodeResponse {
        NodeResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_create_body_disables_refresh_and_replicas() {
        let body = create_body(12);
        assert_eq!(body["settings"]["index"]["number_of_shards"], 12);
        assert_eq!(body["settings"]["index"]["number_of_replicas"], 0);
        assert_eq!(body["settings"]["index"]["refresh_interval"], "-1");
    }

    #[test]
    fn test_classify_create() {
        assert_eq!(classify_create(&response(200, "{}")), Some(AdminOutcome::Success));
        assert_eq!(
            classify_create(&response(
                400,
                r#"{"error":{"type":"resource_already_exists_exception"}}"#
            )),
            Some(AdminOutcome::AlreadyInState)
        );
        assert_eq!(
            classify_create(&response(400, r#"{"error":"IndexAlreadyExistsException","type":"index_already_exists_exception"}"#)),
            Some(AdminOutcome::AlreadyInState)
        );
        assert_eq!(classify_create(&response(400, "mapper_parsing_exception")), None);
        assert_eq!(classify_create(&response(500, "")), None);
    }

    #[test]
    fn test_classify_delete() {
        assert_eq!(classify_delete(&response(200, "{}")), Some(AdminOutcome::Success));
        assert_eq!(
            classify_delete(&response(404, "index_not_found_exception")),
            Some(AdminOutcome::AlreadyInState)
        );
        assert_eq!(classify_delete(&response(503, "")), None);
    }

    #[test]
    fn test_alias_body() {
        let body = alias_body("sales_2020-01-01", "sales-alias");
        assert_eq!(body["actions"][0]["add"]["index"], "sales_2020-01-01");
        assert_eq!(body["actions"][0]["add"]["alias"], "sales-alias");
    }

    #[test]
    fn test_new_rejects_bad_input() {
        assert!(matches!(
            ElasticsearchAdmin::new(&[], &ElasticSettings::default()),
            Err(ElasticError::NoNodes)
        ));
        let nodes = vec![NodeAddr {
            host: "localhost".to_string(),
            port: 9200,
        }];
        let settings = ElasticSettings {
            scheme: "ftp".to_string(),
            ..ElasticSettings::default()
        };
        assert!(ElasticsearchAdmin::new(&nodes, &settings).is_err());
        let admin = ElasticsearchAdmin::new(&nodes, &ElasticSettings::default()).unwrap();
        assert_eq!(admin.base_urls(), ["http://localhost:9200".to_string()]);
    }
}
