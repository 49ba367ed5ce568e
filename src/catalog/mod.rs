//! Endpoint catalog index
//!
//! Flattens the nested catalog table into an identifier -> [`Endpoint`] map and
//! precomputes per-category endpoint counts. The index is built once at startup
//! and shared read-only afterwards.

mod table;

pub use table::{BUNDLED_CATALOG, CatalogTable, CategoryDef, EndpointDef, parse_table, read_table};

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Error, Result};

/// HTTP methods used by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Upper-case method name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Convert to a `reqwest` method
    #[must_use]
    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            other => Err(Error::Protocol(format!("Unsupported HTTP method '{other}'"))),
        }
    }
}

/// Declared parameter or body field (advisory, never enforced)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Declared JSON type (`string`, `integer`, `array`, ...)
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: String,
    /// Whether the field is marked required
    #[serde(default)]
    pub required: bool,
    /// Human description
    #[serde(default)]
    pub description: String,
}

fn default_field_type() -> String {
    "string".to_string()
}

/// Immutable endpoint descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Globally unique identifier (e.g. `getUsers`)
    pub id: String,
    /// Owning category name
    pub category: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Path template with optional `{name}` placeholders
    pub path: String,
    /// Human description
    pub description: String,
    /// Query and path parameters
    pub params: BTreeMap<String, FieldSpec>,
    /// Body fields
    pub body: BTreeMap<String, FieldSpec>,
}

impl Endpoint {
    fn from_def(id: String, category: String, def: EndpointDef) -> Self {
        Self {
            id,
            category,
            method: def.method,
            path: def.path,
            description: def.description,
            params: def.params,
            body: def.body,
        }
    }

    /// Names of params and body fields marked required, params first
    #[must_use]
    pub fn required(&self) -> Vec<String> {
        self.params
            .iter()
            .chain(&self.body)
            .filter(|(_, spec)| spec.required)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Category summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    /// Category name
    pub name: String,
    /// Category description
    pub description: String,
    /// Number of endpoints in the category
    pub endpoint_count: usize,
}

/// Flat, read-only index over the endpoint catalog
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    endpoints: BTreeMap<String, Endpoint>,
    categories: BTreeMap<String, Category>,
}

impl CatalogIndex {
    /// Build the index from a nested table.
    ///
    /// # Panics
    ///
    /// Panics if two categories declare the same endpoint identifier.
    #[must_use]
    pub fn build(table: CatalogTable) -> Self {
        let mut endpoints: BTreeMap<String, Endpoint> = BTreeMap::new();
        let mut categories = BTreeMap::new();

        for (category_name, category) in table {
            categories.insert(
                category_name.clone(),
                Category {
                    name: category_name.clone(),
                    description: category.description,
                    endpoint_count: category.endpoints.len(),
                },
            );

            for (id, def) in category.endpoints {
                if let Some(existing) = endpoints.get(&id) {
                    panic!(
                        "Duplicate endpoint id '{id}' declared in '{}' and '{category_name}'",
                        existing.category
                    );
                }
                let endpoint = Endpoint::from_def(id.clone(), category_name.clone(), def);
                endpoints.insert(id, endpoint);
            }
        }

        info!(
            endpoints = endpoints.len(),
            categories = categories.len(),
            "Catalog indexed"
        );

        Self {
            endpoints,
            categories,
        }
    }

    /// Build the index from the catalog bundled into the binary
    pub fn bundled() -> Result<Self> {
        Ok(Self::build(parse_table(BUNDLED_CATALOG)?))
    }

    /// Build the index from a YAML catalog file
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::build(read_table(path)?))
    }

    /// Exact lookup by identifier
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Endpoint> {
        self.endpoints.get(id)
    }

    /// All endpoints, ordered by identifier
    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.values()
    }

    /// Total number of endpoints
    #[must_use]
    pub fn total_endpoints(&self) -> usize {
        self.endpoints.len()
    }

    /// Categories keyed by name
    #[must_use]
    pub fn categories(&self) -> &BTreeMap<String, Category> {
        &self.categories
    }
}
