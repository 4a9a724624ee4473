use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;

use crate::adapter_error;
use crate::bail;
use crate::error::{AdapterError, AdapterResult, ErrorKind};
use crate::relation_configs::base::{DeclaredIndex, RelationConfigChangeAction, RelationRow};

/// Index method supported by the server.
///
/// InnoDB accepts `HASH` but builds a B-tree and reports it as `BTREE`, so the
/// two compare equal when configs are diffed; see [`IndexMethod::storage_method`].
/// MyISAM reports spatial indexes as `RTREE`, read as [`IndexMethod::Spatial`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexMethod {
    #[default]
    Btree,
    Hash,
    Fulltext,
    Spatial,
}

impl IndexMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexMethod::Btree => "BTREE",
            IndexMethod::Hash => "HASH",
            IndexMethod::Fulltext => "FULLTEXT",
            IndexMethod::Spatial => "SPATIAL",
        }
    }

    /// Returns the method used when comparing index definitions.
    ///
    /// `HASH` and `BTREE` compare equal. Switching an index between the two is
    /// therefore never reported as a change.
    pub fn storage_method(&self) -> IndexMethod {
        match self {
            IndexMethod::Hash => IndexMethod::Btree,
            other => *other,
        }
    }
}

impl fmt::Display for IndexMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexMethod {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BTREE" => Ok(IndexMethod::Btree),
            "HASH" => Ok(IndexMethod::Hash),
            "FULLTEXT" => Ok(IndexMethod::Fulltext),
            "SPATIAL" | "RTREE" => Ok(IndexMethod::Spatial),
            other => bail!(
                ErrorKind::ValidationError,
                "Unsupported index method",
                format!("`{other}` is not one of BTREE, HASH, FULLTEXT, SPATIAL")
            ),
        }
    }
}

/// Definition of one index.
///
/// Two configs are equal when their ordered columns, uniqueness and
/// [`IndexMethod::storage_method`] match. The name only tells the renderer
/// which index to drop.
#[derive(Debug, Clone, Serialize)]
pub struct IndexConfig {
    name: Option<String>,
    column_names: Vec<String>,
    unique: bool,
    method: IndexMethod,
}

impl IndexConfig {
    pub fn new(column_names: Vec<String>, unique: bool, method: IndexMethod) -> AdapterResult<Self> {
        if column_names.is_empty() {
            bail!(
                ErrorKind::ValidationError,
                "Index must have at least one column"
            );
        }
        if column_names.iter().any(|column| column.trim().is_empty()) {
            bail!(
                ErrorKind::ValidationError,
                "Index column names cannot be blank",
                format!("columns: {column_names:?}")
            );
        }

        Ok(Self {
            name: None,
            column_names,
            unique,
            method,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds a config from a declared index. An undeclared method is the server default.
    pub fn from_declared(declared: &DeclaredIndex) -> AdapterResult<Self> {
        let method = match &declared.method {
            Some(method) => method.parse()?,
            None => IndexMethod::default(),
        };
        let config = Self::new(declared.columns.clone(), declared.unique, method)?;

        Ok(match &declared.name {
            Some(name) => config.with_name(name),
            None => config,
        })
    }

    /// Builds a config from one row of the `indexes` introspection result.
    ///
    /// `column_names` may be a comma separated string or an array of strings,
    /// `unique` a boolean or a 0/1 flag.
    pub fn from_relation_row(row: &RelationRow) -> AdapterResult<Self> {
        let column_names = match row.get("column_names") {
            Some(Value::String(columns)) => columns
                .split(',')
                .map(|column| column.trim().to_string())
                .collect(),
            Some(Value::Array(columns)) => columns
                .iter()
                .map(|column| {
                    column.as_str().map(str::to_string).ok_or_else(|| {
                        adapter_error!(
                            ErrorKind::ValidationError,
                            "Index column name is not a string",
                            column
                        )
                    })
                })
                .collect::<AdapterResult<Vec<_>>>()?,
            _ => bail!(
                ErrorKind::ValidationError,
                "Index row has no column names",
                Value::Object(row.clone())
            ),
        };

        let unique = match row.get("unique") {
            Some(Value::Bool(unique)) => *unique,
            Some(Value::Number(flag)) => flag.as_i64().is_some_and(|flag| flag != 0),
            Some(Value::Null) | None => false,
            Some(other) => bail!(
                ErrorKind::ValidationError,
                "Index uniqueness flag is not a boolean",
                other
            ),
        };

        let method = match row.get("method").and_then(Value::as_str) {
            Some(method) => method.parse()?,
            None => IndexMethod::default(),
        };

        let config = Self::new(column_names, unique, method)?;

        Ok(match row.get("name").and_then(Value::as_str) {
            Some(name) => config.with_name(name),
            None => config,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn unique(&self) -> bool {
        self.unique
    }

    pub fn method(&self) -> IndexMethod {
        self.method
    }

    fn key(&self) -> (&[String], bool, IndexMethod) {
        (&self.column_names, self.unique, self.method.storage_method())
    }
}

impl PartialEq for IndexConfig {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for IndexConfig {}

impl Hash for IndexConfig {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for IndexConfig {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexConfig {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for IndexConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unique {
            f.write_str("unique ")?;
        }
        write!(f, "{} ({})", self.method, self.column_names.join(", "))
    }
}

/// A create or drop of one index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IndexConfigChange {
    pub action: RelationConfigChangeAction,
    pub context: IndexConfig,
}

impl IndexConfigChange {
    pub fn create(context: IndexConfig) -> Self {
        Self {
            action: RelationConfigChangeAction::Create,
            context,
        }
    }

    pub fn drop(context: IndexConfig) -> Self {
        Self {
            action: RelationConfigChangeAction::Drop,
            context,
        }
    }

    /// Index changes are applied in place and never rebuild the relation.
    pub fn requires_full_refresh(&self) -> bool {
        false
    }
}
