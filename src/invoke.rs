//! Invocation service: endpoint details and generic execution

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::{Map, Value, json};
use tracing::{error, info, warn};

use crate::catalog::CatalogIndex;
use crate::client::{ApiClient, ApiRequest};
use crate::discovery::endpoint_details;
use crate::outcome::ToolOutcome;

/// Maximum number of identifier suggestions on a lookup miss
pub const MAX_SUGGESTIONS: usize = 10;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("static regex"));

/// Substitute `{name}` placeholders from `params`.
///
/// Returns the resolved path and the params that were not consumed. Missing
/// placeholders stay in the path unresolved.
#[must_use]
pub fn resolve_path(template: &str, params: &Map<String, Value>) -> (String, Map<String, Value>) {
    let mut remaining = params.clone();
    let mut resolved = template.to_string();

    for caps in PLACEHOLDER.captures_iter(template) {
        let name = &caps[1];
        match remaining.remove(name) {
            Some(value) => {
                resolved = resolved.replace(&caps[0], &value_to_param(&value));
            }
            None => warn!(parameter = name, path = template, "Path parameter not provided"),
        }
    }

    (resolved, remaining)
}

/// Flatten params into query pairs; arrays become repeated keys
#[must_use]
pub fn query_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                pairs.extend(
                    items
                        .iter()
                        .filter(|item| !item.is_null())
                        .map(|item| (key.clone(), value_to_param(item))),
                );
            }
            other => pairs.push((key.clone(), value_to_param(other))),
        }
    }
    pairs
}

fn value_to_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Identifiers containing `query` (case-insensitive), in identifier order, at
/// most [`MAX_SUGGESTIONS`]
#[must_use]
pub fn suggestions(index: &CatalogIndex, query: &str) -> Vec<String> {
    let needle = query.to_lowercase();
    index
        .endpoints()
        .filter(|endpoint| endpoint.id.to_lowercase().contains(&needle))
        .take(MAX_SUGGESTIONS)
        .map(|endpoint| endpoint.id.clone())
        .collect()
}

/// Full details of one endpoint, or a miss carrying suggestions
#[must_use]
pub fn details(index: &CatalogIndex, endpoint_id: &str) -> ToolOutcome {
    match index.get(endpoint_id) {
        Some(endpoint) => ToolOutcome::Success(endpoint_details(endpoint)),
        None => ToolOutcome::Failure(json!({
            "error": format!("Endpoint '{endpoint_id}' not found"),
            "suggestions": suggestions(index, endpoint_id),
            "hint": "Use verify_discover to search for the correct endpoint_id",
        })),
    }
}

/// Resolves endpoint calls and shapes their results
pub struct InvocationService {
    index: Arc<CatalogIndex>,
    client: Arc<ApiClient>,
}

impl InvocationService {
    /// Create a service over a shared index and client
    #[must_use]
    pub fn new(index: Arc<CatalogIndex>, client: Arc<ApiClient>) -> Self {
        Self { index, client }
    }

    /// `verify_get_api_details`
    #[must_use]
    pub fn get_details(&self, endpoint_id: &str) -> ToolOutcome {
        details(&self.index, endpoint_id)
    }

    /// `verify_execute`
    ///
    /// Never returns a transport error directly; failures come back as
    /// [`ToolOutcome::Failure`] carrying the endpoint, method and resolved path.
    pub async fn execute(&self, endpoint_id: &str, params: &Map<String, Value>, body: Option<Value>) -> ToolOutcome {
        let Some(endpoint) = self.index.get(endpoint_id) else {
            return ToolOutcome::Failure(json!({
                "error": format!("Endpoint '{endpoint_id}' not found"),
                "hint": "Use verify_discover to find the correct endpoint_id",
            }));
        };

        let (path, remaining) = resolve_path(&endpoint.path, params);
        let mut request = ApiRequest::new(endpoint.method, path.clone()).with_query(query_pairs(&remaining));
        if let Some(body) = body.filter(has_content) {
            request = request.with_body(body);
        }

        info!(endpoint = endpoint_id, method = %endpoint.method, path = %path, "Executing endpoint");

        match self.client.send(&request).await {
            Ok(response) if response.is_error() => ToolOutcome::Failure(response.into_value()),
            Ok(response) => ToolOutcome::Success(response.into_value()),
            Err(e) => {
                error!(endpoint = endpoint_id, method = %endpoint.method, path = %path, error = %e, "Endpoint call failed");
                ToolOutcome::Failure(json!({
                    "error": e.to_string(),
                    "endpoint": endpoint_id,
                    "method": endpoint.method,
                    "path": path,
                }))
            }
        }
    }
}

fn has_content(body: &Value) -> bool {
    match body {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}
