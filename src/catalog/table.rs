//! Raw catalog table as shipped in `data/verify_catalog.yaml`
//!
//! The table is nested `category -> { description, endpoints: { id -> endpoint } }`.
//! It is parsed once and flattened by [`super::CatalogIndex::build`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{FieldSpec, HttpMethod};
use crate::{Error, Result};

/// Catalog bundled into the binary
pub const BUNDLED_CATALOG: &str = include_str!("../../data/verify_catalog.yaml");

/// Nested catalog table keyed by category name
pub type CatalogTable = BTreeMap<String, CategoryDef>;

/// One category of the raw table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryDef {
    /// Human description of the category
    #[serde(default)]
    pub description: String,
    /// Endpoints keyed by their identifier
    #[serde(default)]
    pub endpoints: BTreeMap<String, EndpointDef>,
}

/// One endpoint of the raw table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointDef {
    /// HTTP method
    pub method: HttpMethod,
    /// Path template, may contain `{name}` placeholders
    pub path: String,
    /// Human description
    #[serde(default)]
    pub description: String,
    /// Query and path parameters
    #[serde(default)]
    pub params: BTreeMap<String, FieldSpec>,
    /// Body fields
    #[serde(default)]
    pub body: BTreeMap<String, FieldSpec>,
}

/// Parse a catalog table from YAML text
pub fn parse_table(yaml: &str) -> Result<CatalogTable> {
    serde_yaml::from_str(yaml).map_err(|e| Error::Catalog(e.to_string()))
}

/// Read and parse a catalog table from a YAML file
pub fn read_table(path: &Path) -> Result<CatalogTable> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Catalog(format!("Failed to read {}: {e}", path.display())))?;
    parse_table(&text)
}
