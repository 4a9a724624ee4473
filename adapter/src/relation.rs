//! Logical handle to a MySQL relation.
//!
//! A [`Relation`] names a database object and knows how to render that name
//! under MySQL's quoting rules. Construction goes through [`RelationBuilder`],
//! which rejects identifiers longer than [`MAX_CHARACTERS_IN_IDENTIFIER`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bail;
use crate::dialect;
use crate::error::{AdapterError, AdapterResult, ErrorKind};
use crate::relation_configs::{
    DeclaredRelationConfig, MAX_CHARACTERS_IN_IDENTIFIER, MaterializedViewConfig,
    MaterializedViewConfigChangeCollection, RelationResults, diff,
};

/// Kind of database object a [`Relation`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Table,
    View,
    MaterializedView,
    Cte,
    External,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Table => "table",
            RelationType::View => "view",
            RelationType::MaterializedView => "materialized_view",
            RelationType::Cte => "cte",
            RelationType::External => "external",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationType {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(RelationType::Table),
            "view" => Ok(RelationType::View),
            "materialized_view" => Ok(RelationType::MaterializedView),
            "cte" => Ok(RelationType::Cte),
            "external" => Ok(RelationType::External),
            other => bail!(
                ErrorKind::ValidationError,
                "Unknown relation type",
                format!("`{other}` is not a relation type")
            ),
        }
    }
}

/// Per-component switch used for both quoting and inclusion.
///
/// MySQL has no separate database level above the schema, so the database
/// component is off by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Policy {
    pub database: bool,
    pub schema: bool,
    pub identifier: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            database: false,
            schema: true,
            identifier: true,
        }
    }
}

/// A database object known to the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    database: Option<String>,
    schema: Option<String>,
    identifier: Option<String>,
    relation_type: Option<RelationType>,
    quote_policy: Policy,
    include_policy: Policy,
    renameable_relations: BTreeSet<RelationType>,
    replaceable_relations: BTreeSet<RelationType>,
}

impl Relation {
    pub fn builder() -> RelationBuilder {
        RelationBuilder::default()
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn relation_type(&self) -> Option<RelationType> {
        self.relation_type
    }

    pub fn quote_policy(&self) -> Policy {
        self.quote_policy
    }

    pub fn include_policy(&self) -> Policy {
        self.include_policy
    }

    pub fn is_materialized_view(&self) -> bool {
        self.relation_type == Some(RelationType::MaterializedView)
    }

    /// Whether the relation can be renamed in place.
    pub fn can_be_renamed(&self) -> bool {
        self.relation_type
            .is_some_and(|relation_type| self.renameable_relations.contains(&relation_type))
    }

    /// Whether the relation can be replaced with a `CREATE OR REPLACE` style statement.
    pub fn can_be_replaced(&self) -> bool {
        self.relation_type
            .is_some_and(|relation_type| self.replaceable_relations.contains(&relation_type))
    }

    pub fn relation_max_name_length() -> usize {
        MAX_CHARACTERS_IN_IDENTIFIER
    }

    /// Renders the dotted name, keeping only included components and quoting
    /// those the quote policy asks for.
    pub fn render(&self) -> String {
        let components = [
            (&self.database, self.include_policy.database, self.quote_policy.database),
            (&self.schema, self.include_policy.schema, self.quote_policy.schema),
            (
                &self.identifier,
                self.include_policy.identifier,
                self.quote_policy.identifier,
            ),
        ];

        components
            .into_iter()
            .filter_map(|(value, include, quote)| match value {
                Some(value) if include => Some(if quote {
                    dialect::quote(value)
                } else {
                    value.clone()
                }),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Computes the index changes needed to bring the introspected view in line
    /// with its declared configuration.
    pub fn get_materialized_view_config_change_collection(
        relation_results: &RelationResults,
        declared: &DeclaredRelationConfig,
    ) -> AdapterResult<Option<MaterializedViewConfigChangeCollection>> {
        let existing = MaterializedViewConfig::from_relation_results(relation_results)?;
        let desired = MaterializedViewConfig::from_declared_config(declared)?;

        let changes = diff(&existing, &desired);
        debug!(
            identifier = declared.identifier.as_deref().unwrap_or_default(),
            has_changes = changes.is_some(),
            "compared materialized view configuration"
        );

        Ok(changes)
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Builder for [`Relation`].
#[derive(Debug, Clone, Default)]
pub struct RelationBuilder {
    database: Option<String>,
    schema: Option<String>,
    identifier: Option<String>,
    relation_type: Option<RelationType>,
    quote_policy: Policy,
    include_policy: Policy,
    renameable_relations: BTreeSet<RelationType>,
    replaceable_relations: BTreeSet<RelationType>,
}

impl RelationBuilder {
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn relation_type(mut self, relation_type: RelationType) -> Self {
        self.relation_type = Some(relation_type);
        self
    }

    pub fn quote_policy(mut self, quote_policy: Policy) -> Self {
        self.quote_policy = quote_policy;
        self
    }

    pub fn include_policy(mut self, include_policy: Policy) -> Self {
        self.include_policy = include_policy;
        self
    }

    pub fn renameable_relations(mut self, types: impl IntoIterator<Item = RelationType>) -> Self {
        self.renameable_relations = types.into_iter().collect();
        self
    }

    pub fn replaceable_relations(mut self, types: impl IntoIterator<Item = RelationType>) -> Self {
        self.replaceable_relations = types.into_iter().collect();
        self
    }

    /// Builds the relation.
    ///
    /// Fails with [`ErrorKind::ValidationError`] when both the identifier and
    /// the type are set and the identifier is longer than
    /// [`MAX_CHARACTERS_IN_IDENTIFIER`]. Relations missing either are not checked.
    pub fn build(self) -> AdapterResult<Relation> {
        if let (Some(identifier), Some(_)) = (&self.identifier, self.relation_type) {
            if identifier.chars().count() > MAX_CHARACTERS_IN_IDENTIFIER {
                bail!(
                    ErrorKind::ValidationError,
                    "Relation name is too long",
                    format!(
                        "Relation name '{identifier}' is longer than {MAX_CHARACTERS_IN_IDENTIFIER} characters"
                    )
                );
            }
        }

        Ok(Relation {
            database: self.database,
            schema: self.schema,
            identifier: self.identifier,
            relation_type: self.relation_type,
            quote_policy: self.quote_policy,
            include_policy: self.include_policy,
            renameable_relations: self.renameable_relations,
            replaceable_relations: self.replaceable_relations,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::relation_configs::RelationConfigChangeAction;

    #[test]
    fn identifier_at_limit_is_accepted() {
        let relation = Relation::builder()
            .schema("analytics")
            .identifier("a".repeat(MAX_CHARACTERS_IN_IDENTIFIER))
            .relation_type(RelationType::Table)
            .build()
            .unwrap();

        assert_eq!(
            relation.identifier().map(str::len),
            Some(MAX_CHARACTERS_IN_IDENTIFIER)
        );
    }

    #[test]
    fn identifier_over_limit_is_rejected() {
        let identifier = "a".repeat(MAX_CHARACTERS_IN_IDENTIFIER + 1);
        let err = Relation::builder()
            .identifier(identifier.clone())
            .relation_type(RelationType::MaterializedView)
            .build()
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ValidationError);
        let detail = err.detail().unwrap();
        assert!(detail.contains(&identifier));
        assert!(detail.contains("64"));
    }

    #[test]
    fn untyped_relation_skips_length_check() {
        let relation = Relation::builder()
            .identifier("a".repeat(MAX_CHARACTERS_IN_IDENTIFIER * 2))
            .build()
            .unwrap();

        assert_eq!(relation.relation_type(), None);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let identifier = "é".repeat(MAX_CHARACTERS_IN_IDENTIFIER);
        assert!(identifier.len() > MAX_CHARACTERS_IN_IDENTIFIER);

        Relation::builder()
            .identifier(identifier)
            .relation_type(RelationType::View)
            .build()
            .unwrap();
    }

    #[test]
    fn renders_schema_and_identifier_with_backticks() {
        let relation = Relation::builder()
            .database("def")
            .schema("analytics")
            .identifier("orders")
            .relation_type(RelationType::Table)
            .build()
            .unwrap();

        assert_eq!(relation.render(), "`analytics`.`orders`");
        assert_eq!(relation.to_string(), "`analytics`.`orders`");
    }

    #[test]
    fn render_follows_custom_policies() {
        let relation = Relation::builder()
            .database("def")
            .schema("analytics")
            .identifier("orders")
            .include_policy(Policy {
                database: true,
                schema: true,
                identifier: true,
            })
            .quote_policy(Policy {
                database: false,
                schema: false,
                identifier: true,
            })
            .build()
            .unwrap();

        assert_eq!(relation.render(), "def.analytics.`orders`");
    }

    #[test]
    fn rename_and_replace_are_opt_in() {
        let relation = Relation::builder()
            .identifier("orders")
            .relation_type(RelationType::View)
            .replaceable_relations([RelationType::View])
            .build()
            .unwrap();

        assert!(relation.can_be_replaced());
        assert!(!relation.can_be_renamed());
        assert_eq!(Relation::relation_max_name_length(), 64);
    }

    #[test]
    fn parses_relation_types() {
        assert_eq!(
            "materialized_view".parse::<RelationType>().unwrap(),
            RelationType::MaterializedView
        );
        assert!("index".parse::<RelationType>().is_err());
    }

    #[test]
    fn change_collection_reflects_declared_indexes() {
        let relation_results = RelationResults::new().with(
            RelationResults::INDEXES,
            vec![
                json!({"name": "orders_id", "column_names": "id", "unique": 1, "method": "BTREE"})
                    .as_object()
                    .unwrap()
                    .clone(),
            ],
        );
        let declared: DeclaredRelationConfig = serde_json::from_value(json!({
            "identifier": "orders",
            "indexes": [{"columns": ["id"], "unique": true}, {"columns": ["status"]}]
        }))
        .unwrap();

        let changes =
            Relation::get_materialized_view_config_change_collection(&relation_results, &declared)
                .unwrap()
                .unwrap();

        assert_eq!(changes.indexes().len(), 1);
        assert_eq!(changes.indexes()[0].action, RelationConfigChangeAction::Create);
        assert_eq!(changes.indexes()[0].context.column_names(), ["status"]);
    }
}
