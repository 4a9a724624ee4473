//! Observable configuration of relations and the changes between two of them.
//!
//! A [`MaterializedViewConfig`] is built twice per run: once from what the
//! server reports and once from what the model declares. [`diff`] turns the
//! pair into an optional [`MaterializedViewConfigChangeCollection`].

mod base;
mod constants;
mod index;
mod materialized_view;

pub use base::{
    DeclaredIndex, DeclaredRelationConfig, RelationConfigChangeAction, RelationResults,
    RelationRow,
};
pub use constants::MAX_CHARACTERS_IN_IDENTIFIER;
pub use index::{IndexConfig, IndexConfigChange, IndexMethod};
pub use materialized_view::{MaterializedViewConfig, MaterializedViewConfigChangeCollection, diff};
