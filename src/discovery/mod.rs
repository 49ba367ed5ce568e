//! Discovery service: search, category browsing and result shaping
//!
//! Ranking itself lives in [`crate::ranking`]; this module turns ranked hits
//! into the caller-facing JSON of `verify_discover` and
//! `verify_list_categories`.

mod domains;

pub use domains::Domain;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::catalog::{CatalogIndex, Endpoint, HttpMethod};
use crate::outcome::ToolOutcome;
use crate::ranking::{ScoredEndpoint, SearchFilter, rank};

/// Results per page
pub const PAGE_SIZE: usize = 25;

/// Match counts at or below this get full schemas inline
pub const INLINE_DETAIL_LIMIT: usize = 3;

/// Compact endpoint summary used in search listings
#[must_use]
pub fn endpoint_summary(endpoint: &Endpoint) -> Value {
    json!({
        "endpoint_id": endpoint.id,
        "method": endpoint.method,
        "path": endpoint.path,
        "category": endpoint.category,
        "description": endpoint.description,
    })
}

/// Full endpoint schema; empty sections are omitted
#[must_use]
pub fn endpoint_details(endpoint: &Endpoint) -> Value {
    let mut detail = endpoint_summary(endpoint);
    if let Value::Object(ref mut map) = detail {
        if !endpoint.params.is_empty() {
            map.insert("params".to_string(), json!(endpoint.params));
        }
        if !endpoint.body.is_empty() {
            map.insert("body".to_string(), json!(endpoint.body));
        }
        let required = endpoint.required();
        if !required.is_empty() {
            map.insert("required".to_string(), json!(required));
        }
    }
    detail
}

/// A `verify_discover` request
#[derive(Debug, Clone, Default)]
pub struct DiscoverQuery {
    /// Keyword
    pub query: String,
    /// Category substring filter
    pub category: Option<String>,
    /// HTTP method filter
    pub method: Option<String>,
    /// Pagination offset
    pub offset: usize,
}

impl DiscoverQuery {
    /// Query without filters
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}

/// Query interface over the catalog index
#[derive(Clone)]
pub struct DiscoveryService {
    index: Arc<CatalogIndex>,
}

impl DiscoveryService {
    /// Create a service over a shared index
    #[must_use]
    pub fn new(index: Arc<CatalogIndex>) -> Self {
        Self { index }
    }

    /// Underlying index
    #[must_use]
    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    /// Ranked matches for a query.
    ///
    /// An unrecognised method filter matches nothing.
    #[must_use]
    pub fn search(&self, query: &str, category: Option<&str>, method: Option<&str>) -> Vec<ScoredEndpoint<'_>> {
        let method = match method.map(str::parse::<HttpMethod>) {
            None => None,
            Some(Ok(m)) => Some(m),
            Some(Err(_)) => return Vec::new(),
        };
        let filter = SearchFilter { category, method };
        rank(&self.index, query, filter)
    }

    /// `verify_discover`
    #[must_use]
    pub fn discover(&self, request: &DiscoverQuery) -> ToolOutcome {
        let results = self.search(
            &request.query,
            request.category.as_deref(),
            request.method.as_deref(),
        );
        let total_available = self.index.total_endpoints();

        debug!(query = %request.query, matches = results.len(), offset = request.offset, "Discover");

        if results.is_empty() {
            return ToolOutcome::Success(json!({
                "message": format!("No endpoints found matching '{}'", request.query),
                "hint": "Try broader keywords or use verify_list_categories to browse",
                "total_available": total_available,
            }));
        }

        let matches = results.len();
        let mut output = Map::new();
        output.insert("matches".to_string(), json!(matches));
        output.insert("total_available".to_string(), json!(total_available));

        if request.offset >= matches {
            output.insert("endpoints".to_string(), json!([]));
            output.insert("showing".to_string(), Value::Null);
            output.insert(
                "hint".to_string(),
                json!(format!(
                    "Offset {} is past the last match; use an offset below {matches}",
                    request.offset
                )),
            );
            return ToolOutcome::Success(Value::Object(output));
        }

        let end = (request.offset + PAGE_SIZE).min(matches);
        let page = &results[request.offset..end];
        let render: fn(&Endpoint) -> Value = if matches <= INLINE_DETAIL_LIMIT {
            endpoint_details
        } else {
            endpoint_summary
        };

        let spans_categories = results
            .iter()
            .any(|r| r.endpoint.category != results[0].endpoint.category);

        if spans_categories {
            // groups keep the order in which their best hit was ranked
            let mut by_category = Map::new();
            for hit in page {
                let mut entry = render(hit.endpoint);
                if let Value::Object(ref mut map) = entry {
                    map.remove("category");
                }
                if let Value::Array(group) = by_category
                    .entry(hit.endpoint.category.clone())
                    .or_insert_with(|| Value::Array(Vec::new()))
                {
                    group.push(entry);
                }
            }
            output.insert("by_category".to_string(), Value::Object(by_category));
        } else {
            let endpoints: Vec<Value> = page.iter().map(|hit| render(hit.endpoint)).collect();
            output.insert("endpoints".to_string(), Value::Array(endpoints));
        }

        if matches > PAGE_SIZE {
            output.insert(
                "showing".to_string(),
                json!(format!("{}-{end} of {matches}", request.offset + 1)),
            );
            if end < matches {
                output.insert("next_offset".to_string(), json!(end));
            }
        }

        ToolOutcome::Success(Value::Object(output))
    }

    /// `verify_list_categories`
    #[must_use]
    pub fn list_categories(&self) -> ToolOutcome {
        let categories = self.index.categories();

        let mut domains: BTreeMap<&'static str, BTreeMap<&str, usize>> = BTreeMap::new();
        for category in categories.values() {
            domains
                .entry(Domain::classify(&category.name).as_str())
                .or_default()
                .insert(category.name.as_str(), category.endpoint_count);
        }

        ToolOutcome::Success(json!({
            "total_categories": categories.len(),
            "total_endpoints": self.index.total_endpoints(),
            "domains": domains,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_table;
    use pretty_assertions::assert_eq;

    fn service_from(yaml: &str) -> DiscoveryService {
        DiscoveryService::new(Arc::new(CatalogIndex::build(parse_table(yaml).unwrap())))
    }

    fn bundled() -> DiscoveryService {
        DiscoveryService::new(Arc::new(CatalogIndex::bundled().unwrap()))
    }

    /// One category with `n` endpoints named `ep000`, `ep001`, ...
    fn wide_catalog(n: usize) -> String {
        let mut yaml = String::from("Wide:\n  description: many\n  endpoints:\n");
        for i in 0..n {
            yaml.push_str(&format!(
                "    ep{i:03}: {{method: GET, path: /v1.0/wide/{i}, description: Widget number {i}}}\n"
            ));
        }
        yaml
    }

    #[test]
    fn no_match_returns_message_and_hint() {
        let value = bundled().discover(&DiscoverQuery::new("zzzzqqq")).into_value();
        assert_eq!(value["message"], "No endpoints found matching 'zzzzqqq'");
        assert_eq!(
            value["hint"],
            "Try broader keywords or use verify_list_categories to browse"
        );
        assert!(value["total_available"].as_u64().unwrap() > 200);
    }

    #[test]
    fn few_matches_carry_full_schema() {
        let value = bundled().discover(&DiscoverQuery::new("createUser")).into_value();
        let matches = value["matches"].as_u64().unwrap();
        assert!(matches <= INLINE_DETAIL_LIMIT as u64, "{value}");
        let first = value["endpoints"]
            .as_array()
            .or_else(|| value["by_category"].as_object().and_then(|m| m.values().next()?.as_array()))
            .unwrap()[0]
            .clone();
        assert_eq!(first["endpoint_id"], "createUser");
        assert!(first.get("body").is_some());
    }

    #[test]
    fn many_matches_get_summaries_and_pagination() {
        let service = service_from(&wide_catalog(60));
        let value = service.discover(&DiscoverQuery::new("widget")).into_value();
        assert_eq!(value["matches"], 60);
        assert_eq!(value["showing"], "1-25 of 60");
        assert_eq!(value["next_offset"], 25);
        let endpoints = value["endpoints"].as_array().unwrap();
        assert_eq!(endpoints.len(), PAGE_SIZE);
        assert_eq!(endpoints[0]["endpoint_id"], "ep000");
        assert!(endpoints[0].get("params").is_none());

        let last = service
            .discover(&DiscoverQuery {
                offset: 50,
                ..DiscoverQuery::new("widget")
            })
            .into_value();
        assert_eq!(last["showing"], "51-60 of 60");
        assert!(last.get("next_offset").is_none());
        assert_eq!(last["endpoints"].as_array().unwrap().len(), 10);
    }

    #[test]
    fn offset_past_end_returns_empty_page() {
        let service = service_from(&wide_catalog(5));
        let value = service
            .discover(&DiscoverQuery {
                offset: 9,
                ..DiscoverQuery::new("widget")
            })
            .into_value();
        assert_eq!(value["matches"], 5);
        assert_eq!(value["endpoints"], json!([]));
        assert_eq!(value["showing"], Value::Null);
    }

    #[test]
    fn multiple_categories_are_grouped() {
        let yaml = r"
A:
  endpoints:
    listAlpha: {method: GET, path: /a, description: List things}
    listBeta: {method: GET, path: /b, description: List things}
B:
  endpoints:
    listGamma: {method: GET, path: /c, description: List things}
    listDelta: {method: GET, path: /d, description: List things}
";
        let value = service_from(yaml).discover(&DiscoverQuery::new("things")).into_value();
        assert!(value.get("endpoints").is_none());
        let groups = value["by_category"].as_object().unwrap();
        assert_eq!(groups["A"].as_array().unwrap().len(), 2);
        assert_eq!(groups["B"][0]["endpoint_id"], "listDelta");
        assert!(groups["B"][0].get("category").is_none());
    }

    #[test]
    fn groups_follow_rank_not_name() {
        let yaml = r"
Alpha Weak:
  endpoints:
    getWidgetTypes: {method: GET, path: /types, description: Widget types}
Zulu Strong:
  endpoints:
    getWidget: {method: GET, path: '/widgets/{id}', description: Read one}
    listWidgetOwners: {method: GET, path: /owners, description: Owners of getWidget results}
";
        let value = service_from(yaml).discover(&DiscoverQuery::new("getWidget")).into_value();
        let groups: Vec<&String> = value["by_category"].as_object().unwrap().keys().collect();
        assert_eq!(groups, ["Zulu Strong", "Alpha Weak"]);
        assert_eq!(value["by_category"]["Zulu Strong"][0]["endpoint_id"], "getWidget");
    }

    #[test]
    fn exact_id_leads_grouped_output() {
        let service = bundled();
        for id in ["getUser", "getIdentitySource"] {
            let value = service.discover(&DiscoverQuery::new(id)).into_value();
            let first = value["endpoints"]
                .as_array()
                .or_else(|| value["by_category"].as_object().and_then(|m| m.values().next()?.as_array()))
                .unwrap()[0]
                .clone();
            assert_eq!(first["endpoint_id"], id, "{value}");
        }
    }

    #[test]
    fn unknown_method_filter_matches_nothing() {
        let value = bundled()
            .discover(&DiscoverQuery {
                method: Some("TRACE".to_string()),
                ..DiscoverQuery::new("user")
            })
            .into_value();
        assert!(value.get("message").is_some());
    }

    #[test]
    fn search_respects_category_filter() {
        let service = bundled();
        let results = service.search("user", Some("fido2"), None);
        assert!(!results.is_empty());
        assert!(
            results
                .iter()
                .all(|r| r.endpoint.category.to_lowercase().contains("fido2"))
        );
    }

    #[test]
    fn list_categories_partitions_every_category() {
        let service = bundled();
        let value = service.list_categories().into_value();
        let total = value["total_categories"].as_u64().unwrap();
        let domains = value["domains"].as_object().unwrap();

        let grouped: usize = domains.values().map(|d| d.as_object().unwrap().len()).sum();
        assert_eq!(grouped as u64, total);

        let counted: u64 = domains
            .values()
            .flat_map(|d| d.as_object().unwrap().values())
            .map(|c| c.as_u64().unwrap())
            .sum();
        assert_eq!(counted, value["total_endpoints"].as_u64().unwrap());
        assert!(domains["mfa"]["FIDO2"].as_u64().unwrap() > 0);
    }

    #[test]
    fn details_omit_empty_sections() {
        let yaml = r"
S:
  endpoints:
    ping: {method: GET, path: /ping, description: Ping}
";
        let service = service_from(yaml);
        let detail = endpoint_details(service.index().get("ping").unwrap());
        assert_eq!(
            detail,
            json!({
                "endpoint_id": "ping",
                "method": "GET",
                "path": "/ping",
                "category": "S",
                "description": "Ping",
            })
        );
    }
}
