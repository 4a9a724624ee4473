use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::error::AdapterResult;
use crate::relation_configs::base::{DeclaredRelationConfig, RelationResults};
use crate::relation_configs::index::{IndexConfig, IndexConfigChange};

/// The parts of a materialized view that can change without rebuilding it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaterializedViewConfig {
    indexes: BTreeSet<IndexConfig>,
}

impl MaterializedViewConfig {
    /// Creates a config from index definitions. Structurally equal indexes collapse.
    pub fn new(indexes: impl IntoIterator<Item = IndexConfig>) -> Self {
        Self {
            indexes: indexes.into_iter().collect(),
        }
    }

    pub fn indexes(&self) -> &BTreeSet<IndexConfig> {
        &self.indexes
    }

    /// Builds the config the server currently reports.
    pub fn from_relation_results(relation_results: &RelationResults) -> AdapterResult<Self> {
        let indexes = relation_results
            .get(RelationResults::INDEXES)
            .iter()
            .map(IndexConfig::from_relation_row)
            .collect::<AdapterResult<BTreeSet<_>>>()?;

        Ok(Self { indexes })
    }

    /// Builds the config the model declares.
    pub fn from_declared_config(declared: &DeclaredRelationConfig) -> AdapterResult<Self> {
        let indexes = declared
            .indexes
            .iter()
            .map(IndexConfig::from_declared)
            .collect::<AdapterResult<BTreeSet<_>>>()?;

        Ok(Self { indexes })
    }
}

/// Ordered changes needed to turn one materialized view config into another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaterializedViewConfigChangeCollection {
    indexes: Vec<IndexConfigChange>,
}

impl MaterializedViewConfigChangeCollection {
    pub fn indexes(&self) -> &[IndexConfigChange] {
        &self.indexes
    }

    pub fn has_changes(&self) -> bool {
        !self.indexes.is_empty()
    }

    pub fn requires_full_refresh(&self) -> bool {
        self.indexes
            .iter()
            .any(IndexConfigChange::requires_full_refresh)
    }

    pub(crate) fn push(&mut self, change: IndexConfigChange) {
        self.indexes.push(change);
    }
}

/// Computes the index changes that turn `existing` into `desired`.
///
/// Every drop comes before every create: a redefined index keeps its name, so
/// the old definition has to be gone before the new one is created. Returns
/// [`None`] when the two configs hold the same indexes.
pub fn diff(
    existing: &MaterializedViewConfig,
    desired: &MaterializedViewConfig,
) -> Option<MaterializedViewConfigChangeCollection> {
    let mut changes = MaterializedViewConfigChangeCollection::default();

    for index in existing.indexes.difference(&desired.indexes) {
        changes.push(IndexConfigChange::drop(index.clone()));
    }
    let drops = changes.indexes.len();

    for index in desired.indexes.difference(&existing.indexes) {
        changes.push(IndexConfigChange::create(index.clone()));
    }
    let creates = changes.indexes.len() - drops;

    debug!(drops, creates, "computed materialized view index changes");

    changes.has_changes().then_some(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation_configs::base::RelationConfigChangeAction;
    use crate::relation_configs::index::IndexMethod;

    fn index(columns: &[&str], unique: bool) -> IndexConfig {
        IndexConfig::new(
            columns.iter().map(|column| column.to_string()).collect(),
            unique,
            IndexMethod::Btree,
        )
        .unwrap()
    }

    #[test]
    fn identical_configs_have_no_changes() {
        let config = MaterializedViewConfig::new([index(&["a"], true), index(&["b", "c"], false)]);

        let empty = MaterializedViewConfig::default();

        assert!(diff(&config, &config.clone()).is_none());
        assert!(diff(&empty, &empty).is_none());
    }

    #[test]
    fn drops_come_before_creates() {
        let existing = MaterializedViewConfig::new([index(&["z"], false), index(&["y"], true)]);
        let desired = MaterializedViewConfig::new([index(&["a"], false), index(&["b"], true)]);

        let changes = diff(&existing, &desired).unwrap();
        let actions: Vec<_> = changes.indexes().iter().map(|change| change.action).collect();

        assert_eq!(
            actions,
            [
                RelationConfigChangeAction::Drop,
                RelationConfigChangeAction::Drop,
                RelationConfigChangeAction::Create,
                RelationConfigChangeAction::Create,
            ]
        );
    }

    #[test]
    fn redefined_index_is_dropped_then_created() {
        let old = index(&["x"], false).with_name("idx_a");
        let new = index(&["x", "y"], false).with_name("idx_a");

        let changes = diff(
            &MaterializedViewConfig::new([old.clone()]),
            &MaterializedViewConfig::new([new.clone()]),
        )
        .unwrap();

        assert_eq!(
            changes.indexes(),
            [IndexConfigChange::drop(old), IndexConfigChange::create(new)]
        );
        assert_eq!(changes.indexes()[0].context.name(), Some("idx_a"));
    }

    #[test]
    fn duplicate_indexes_collapse() {
        let single = MaterializedViewConfig::new([index(&["a"], false)]);
        let doubled = MaterializedViewConfig::new([index(&["a"], false), index(&["a"], false)]);

        assert_eq!(doubled.indexes().len(), 1);
        assert!(diff(&single, &doubled).is_none());
        assert!(diff(&doubled, &single).is_none());
    }

    #[test]
    fn has_changes_matches_presence() {
        let empty = MaterializedViewConfigChangeCollection::default();
        assert!(!empty.has_changes());
        assert!(!empty.requires_full_refresh());

        let changes = diff(
            &MaterializedViewConfig::default(),
            &MaterializedViewConfig::new([index(&["a"], false)]),
        )
        .unwrap();
        assert!(changes.has_changes());
        assert!(!changes.requires_full_refresh());
    }

    #[test]
    fn only_new_index_is_created() {
        let existing = MaterializedViewConfig::new([index(&["a"], true)]);
        let desired = MaterializedViewConfig::new([index(&["a"], true), index(&["b"], false)]);

        let changes = diff(&existing, &desired).unwrap();

        assert!(changes.has_changes());
        assert_eq!(changes.indexes(), [IndexConfigChange::create(index(&["b"], false))]);
    }
}
