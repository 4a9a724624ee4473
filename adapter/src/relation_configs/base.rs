use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of change applied to one component of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationConfigChangeAction {
    Create,
    Drop,
}

impl RelationConfigChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationConfigChangeAction::Create => "create",
            RelationConfigChangeAction::Drop => "drop",
        }
    }
}

impl fmt::Display for RelationConfigChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row returned by an introspection query, column name to value.
pub type RelationRow = Map<String, Value>;

/// Introspection results for a single relation, keyed by result name.
///
/// The `indexes` entry holds one row per index with the keys `name`,
/// `column_names`, `unique` and `method`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationResults {
    results: BTreeMap<String, Vec<RelationRow>>,
}

impl RelationResults {
    pub const INDEXES: &'static str = "indexes";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, rows: Vec<RelationRow>) {
        self.results.insert(name.into(), rows);
    }

    pub fn with(mut self, name: impl Into<String>, rows: Vec<RelationRow>) -> Self {
        self.insert(name, rows);
        self
    }

    /// Returns the rows stored under `name`, empty when the query returned nothing.
    pub fn get(&self, name: &str) -> &[RelationRow] {
        self.results.get(name).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Index as declared in model configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredIndex {
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(rename = "type", default)]
    pub method: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Model configuration of a relation as handed over by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredRelationConfig {
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub indexes: Vec<DeclaredIndex>,
}
