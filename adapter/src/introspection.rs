//! Queries that read the current shape of a relation from `information_schema`.

use serde_json::Value;
use sqlx::{MySqlConnection, Row};
use tracing::warn;

use crate::connection::exception_handler;
use crate::error::AdapterResult;
use crate::relation_configs::{RelationResults, RelationRow};

const DESCRIBE_INDEXES_QUERY: &str = r#"
    SELECT
        s.index_name AS index_name,
        s.column_name AS column_name,
        CAST(s.non_unique AS SIGNED) AS non_unique,
        s.index_type AS index_type
    FROM information_schema.statistics s
    WHERE s.table_schema = ?
    AND s.table_name = ?
    AND s.index_name <> 'PRIMARY'
    ORDER BY s.index_name, s.seq_in_index
"#;

/// One key part of one index as reported by `information_schema.statistics`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumn {
    pub index_name: String,
    /// [`None`] for functional key parts, which index an expression.
    pub column_name: Option<String>,
    pub non_unique: bool,
    pub index_type: String,
}

/// Reads the secondary indexes of `schema`.`identifier` into the `indexes`
/// entry of a [`RelationResults`].
pub async fn describe_indexes(
    connection: &mut MySqlConnection,
    schema: &str,
    identifier: &str,
) -> AdapterResult<RelationResults> {
    let rows = exception_handler(
        DESCRIBE_INDEXES_QUERY,
        sqlx::query(DESCRIBE_INDEXES_QUERY)
            .bind(schema)
            .bind(identifier)
            .fetch_all(&mut *connection),
    )
    .await?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let non_unique: i64 = row.try_get("non_unique")?;
        columns.push(IndexColumn {
            index_name: row.try_get("index_name")?,
            column_name: row.try_get("column_name")?,
            non_unique: non_unique != 0,
            index_type: row.try_get("index_type")?,
        });
    }

    Ok(RelationResults::new().with(RelationResults::INDEXES, fold_index_columns(columns)))
}

/// Groups consecutive per-column rows into one row per index.
///
/// Rows must be ordered by index name, then by position within the index.
/// Indexes with a functional key part cannot be described as a column list
/// and are left out.
pub fn fold_index_columns(columns: impl IntoIterator<Item = IndexColumn>) -> Vec<RelationRow> {
    let mut indexes: Vec<(IndexColumn, Vec<Option<String>>)> = Vec::new();

    for column in columns {
        match indexes.last_mut() {
            Some((first, names)) if first.index_name == column.index_name => {
                names.push(column.column_name);
            }
            _ => {
                let names = vec![column.column_name.clone()];
                indexes.push((column, names));
            }
        }
    }

    indexes
        .into_iter()
        .filter_map(|(first, names)| {
            let Some(names) = names.into_iter().collect::<Option<Vec<_>>>() else {
                warn!(
                    index = %first.index_name,
                    "skipping index with a functional key part"
                );
                return None;
            };

            let mut row = RelationRow::new();
            row.insert("name".to_string(), Value::String(first.index_name));
            row.insert("column_names".to_string(), Value::from(names));
            row.insert("unique".to_string(), Value::Bool(!first.non_unique));
            row.insert("method".to_string(), Value::String(first.index_type));
            Some(row)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::relation_configs::{IndexMethod, MaterializedViewConfig};

    fn column(
        index_name: &str,
        column_name: &str,
        non_unique: bool,
        index_type: &str,
    ) -> IndexColumn {
        IndexColumn {
            index_name: index_name.to_string(),
            column_name: Some(column_name.to_string()),
            non_unique,
            index_type: index_type.to_string(),
        }
    }

    #[test]
    fn folds_columns_in_index_order() {
        let rows = fold_index_columns([
            column("orders_customer_date", "customer_id", true, "BTREE"),
            column("orders_customer_date", "order_date", true, "BTREE"),
            column("orders_number", "order_number", false, "HASH"),
        ]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "orders_customer_date");
        assert_eq!(rows[0]["column_names"], json!(["customer_id", "order_date"]));
        assert_eq!(rows[0]["unique"], false);
        assert_eq!(rows[1]["unique"], true);
        assert_eq!(rows[1]["method"], "HASH");
    }

    #[test]
    fn folded_rows_build_a_materialized_view_config() {
        let rows = fold_index_columns([
            column("notes_body", "body", true, "FULLTEXT"),
            column("notes_id", "id", false, "BTREE"),
        ]);
        let results = RelationResults::new().with(RelationResults::INDEXES, rows);

        let config = MaterializedViewConfig::from_relation_results(&results).unwrap();
        let methods: Vec<_> = config.indexes().iter().map(|index| index.method()).collect();

        assert_eq!(config.indexes().len(), 2);
        assert!(methods.contains(&IndexMethod::Fulltext));
        assert!(methods.contains(&IndexMethod::Btree));
    }

    #[test]
    fn indexes_with_functional_key_parts_are_skipped() {
        let rows = fold_index_columns([
            column("orders_lower_email", "customer_id", true, "BTREE"),
            IndexColumn {
                column_name: None,
                ..column("orders_lower_email", "", true, "BTREE")
            },
            column("orders_status", "status", true, "BTREE"),
        ]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "orders_status");
    }

    #[test]
    fn myisam_spatial_indexes_are_read_back() {
        let rows = fold_index_columns([column("places_area", "area", true, "RTREE")]);
        let results = RelationResults::new().with(RelationResults::INDEXES, rows);

        let config = MaterializedViewConfig::from_relation_results(&results).unwrap();
        let index = config.indexes().first().unwrap();

        assert_eq!(index.method(), IndexMethod::Spatial);
    }

    #[test]
    fn no_columns_means_no_indexes() {
        assert!(fold_index_columns(Vec::new()).is_empty());
    }
}
