//! MySQL adapter core for a data transformation engine.
//!
//! The crate opens and tracks connections through [`connection::ConnectionManager`],
//! maps driver failures onto [`error::ErrorKind`], and computes the index
//! changes a materialized view needs via [`relation_configs::diff`].

pub mod column;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod introspection;
mod macros;
pub mod relation;
pub mod relation_configs;
pub mod response;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
