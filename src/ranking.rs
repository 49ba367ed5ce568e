//! Keyword relevance ranking over catalog endpoints
//!
//! Every endpoint passing the category/method filters gets an integer score:
//!
//! - 4: query equals the identifier (case-insensitive)
//! - 3: query is a whole word inside the identifier
//! - 2: query is a whole word inside the path or description
//! - 1: query is a substring of `id path description category`
//! - 0: excluded
//!
//! Results are ordered by score descending, then identifier ascending, so
//! identical inputs always produce identical output.

use regex::Regex;

use crate::catalog::{CatalogIndex, Endpoint, HttpMethod};

/// Exact identifier match
pub const SCORE_EXACT_ID: u8 = 4;
/// Whole-word match inside the identifier
pub const SCORE_WORD_IN_ID: u8 = 3;
/// Whole-word match inside path or description
pub const SCORE_WORD_IN_TEXT: u8 = 2;
/// Substring match anywhere
pub const SCORE_SUBSTRING: u8 = 1;

/// One ranked search hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredEndpoint<'a> {
    /// Relevance score (1..=4)
    pub score: u8,
    /// Matched endpoint
    pub endpoint: &'a Endpoint,
}

/// Optional conjunctive filters applied before scoring
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchFilter<'a> {
    /// Case-insensitive substring of the category name
    pub category: Option<&'a str>,
    /// Exact HTTP method
    pub method: Option<HttpMethod>,
}

impl SearchFilter<'_> {
    fn accepts(&self, endpoint: &Endpoint) -> bool {
        if let Some(category) = self.category {
            if !endpoint
                .category
                .to_lowercase()
                .contains(&category.to_lowercase())
            {
                return false;
            }
        }
        self.method.is_none_or(|m| m == endpoint.method)
    }
}

/// Compiled query
pub struct QueryMatcher {
    query_lower: String,
    word_pattern: Option<Regex>,
}

impl QueryMatcher {
    /// Compile a query
    #[must_use]
    pub fn new(query: &str) -> Self {
        let query_lower = query.trim().to_lowercase();
        let word_pattern = if query_lower.is_empty() {
            None
        } else {
            Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&query_lower))).ok()
        };
        Self {
            query_lower,
            word_pattern,
        }
    }

    /// Score one endpoint; 0 means no match
    #[must_use]
    pub fn score(&self, endpoint: &Endpoint) -> u8 {
        if self.query_lower.is_empty() {
            return SCORE_SUBSTRING;
        }

        if endpoint.id.to_lowercase() == self.query_lower {
            return SCORE_EXACT_ID;
        }

        if let Some(ref pattern) = self.word_pattern {
            if pattern.is_match(&endpoint.id) {
                return SCORE_WORD_IN_ID;
            }
            if pattern.is_match(&endpoint.path) || pattern.is_match(&endpoint.description) {
                return SCORE_WORD_IN_TEXT;
            }
        }

        let searchable = format!(
            "{} {} {} {}",
            endpoint.id, endpoint.path, endpoint.description, endpoint.category
        )
        .to_lowercase();
        if searchable.contains(&self.query_lower) {
            SCORE_SUBSTRING
        } else {
            0
        }
    }
}

/// Filter, score and order the catalog for a query
#[must_use]
pub fn rank<'a>(index: &'a CatalogIndex, query: &str, filter: SearchFilter<'_>) -> Vec<ScoredEndpoint<'a>> {
    let matcher = QueryMatcher::new(query);

    let mut results: Vec<ScoredEndpoint<'a>> = index
        .endpoints()
        .filter(|endpoint| filter.accepts(endpoint))
        .filter_map(|endpoint| {
            let score = matcher.score(endpoint);
            (score > 0).then_some(ScoredEndpoint { score, endpoint })
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.endpoint.id.cmp(&b.endpoint.id))
    });

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_table;
    use pretty_assertions::assert_eq;

    const FIXTURE: &str = r"
Users Management v2.0 (SCIM):
  description: SCIM users
  endpoints:
    getUsers: {method: GET, path: /v2.0/Users, description: Search users}
    getUser: {method: GET, path: '/v2.0/Users/{id}', description: Get a user by id}
    createUser: {method: POST, path: /v2.0/Users, description: Create a user}
    changePassword: {method: POST, path: '/v2.0/Users/{id}/password', description: Change a user password}
FIDO2:
  description: Passkeys
  endpoints:
    listFido2Registrations: {method: GET, path: /v2.0/factors/fido2/registrations, description: List registrations for a user}
    deleteFido2Registration: {method: DELETE, path: '/v2.0/factors/fido2/registrations/{id}', description: Delete a registration}
Applications:
  description: Apps
  endpoints:
    getApplications: {method: GET, path: /v1.0/applications, description: List applications}
";

    fn index() -> CatalogIndex {
        CatalogIndex::build(parse_table(FIXTURE).unwrap())
    }

    fn ids(results: &[ScoredEndpoint<'_>]) -> Vec<String> {
        results.iter().map(|r| r.endpoint.id.clone()).collect()
    }

    #[test]
    fn exact_identifier_ranks_first() {
        let index = index();
        let results = rank(&index, "GETUSER", SearchFilter::default());
        assert_eq!(results[0].endpoint.id, "getUser");
        assert_eq!(results[0].score, SCORE_EXACT_ID);
    }

    #[test]
    fn every_identifier_ranks_itself_first() {
        let index = index();
        for endpoint in index.endpoints() {
            let results = rank(&index, &endpoint.id, SearchFilter::default());
            assert_eq!(results[0].endpoint.id, endpoint.id);
        }
    }

    #[test]
    fn word_in_text_beats_substring_and_ties_break_by_id() {
        let index = index();
        let results = rank(&index, "user", SearchFilter::default());
        let scored: Vec<(u8, &str)> = results
            .iter()
            .map(|r| (r.score, r.endpoint.id.as_str()))
            .collect();
        assert_eq!(
            scored,
            vec![
                (2, "changePassword"),
                (2, "createUser"),
                (2, "getUser"),
                (2, "listFido2Registrations"),
                (1, "getUsers"),
            ]
        );
    }

    #[test]
    fn word_inside_identifier_scores_three() {
        let yaml = r"
Misc:
  endpoints:
    get-token: {method: POST, path: /x, description: Issue}
    token_introspect: {method: POST, path: /y, description: Introspect}
    tokens: {method: GET, path: /z, description: List}
";
        let index = CatalogIndex::build(parse_table(yaml).unwrap());
        let scored: Vec<(u8, String)> = rank(&index, "token", SearchFilter::default())
            .iter()
            .map(|r| (r.score, r.endpoint.id.clone()))
            .collect();
        // `_` is a word character, so "token_introspect" has no boundary after "token"
        assert_eq!(
            scored,
            vec![
                (SCORE_WORD_IN_ID, "get-token".to_string()),
                (SCORE_SUBSTRING, "token_introspect".to_string()),
                (SCORE_SUBSTRING, "tokens".to_string()),
            ]
        );
    }

    #[test]
    fn filters_are_conjunctive() {
        let index = index();
        let filter = SearchFilter {
            category: Some("fido2"),
            method: None,
        };
        let results = rank(&index, "user", filter);
        assert_eq!(ids(&results), vec!["listFido2Registrations"]);

        let filter = SearchFilter {
            category: None,
            method: Some(HttpMethod::Post),
        };
        let results = rank(&index, "user", filter);
        assert_eq!(ids(&results), vec!["changePassword", "createUser"]);
    }

    #[test]
    fn empty_query_matches_everything_in_id_order() {
        let index = index();
        let results = rank(&index, "  ", SearchFilter::default());
        assert_eq!(results.len(), index.total_endpoints());
        assert!(results.iter().all(|r| r.score == SCORE_SUBSTRING));
        assert_eq!(results[0].endpoint.id, "changePassword");
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let index = index();
        assert!(rank(&index, "{id}", SearchFilter::default())
            .iter()
            .all(|r| r.endpoint.path.contains("{id}")));
        assert!(rank(&index, "[", SearchFilter::default()).is_empty());
    }

    #[test]
    fn ordering_is_stable_across_calls() {
        let index = index();
        let first = ids(&rank(&index, "registration", SearchFilter::default()));
        let second = ids(&rank(&index, "registration", SearchFilter::default()));
        assert_eq!(first, second);
    }
}
