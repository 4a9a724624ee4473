use std::fmt;

use serde::Serialize;
use sqlx::mysql::MySqlQueryResult;

/// Status code reported for every completed statement.
///
/// The MySQL driver does not expose a status string for completed
/// statements, so the code is always the default one.
pub const SUCCESS_CODE: &str = "SUCCESS";

/// Normalized outcome of a statement, reported back to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterResponse {
    /// Human readable summary, `"{code} {rows_affected}"`.
    pub message: String,
    pub code: String,
    pub rows_affected: u64,
}

impl fmt::Display for AdapterResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Anything that can report how many rows a statement touched.
pub trait QueryOutcome {
    /// Returns the affected row count, or [`None`] when the driver did not report one.
    fn rows_affected(&self) -> Option<u64>;
}

impl QueryOutcome for MySqlQueryResult {
    fn rows_affected(&self) -> Option<u64> {
        Some(MySqlQueryResult::rows_affected(self))
    }
}

/// Outcome of a statement run through a [`crate::connection::NativeHandle`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    rows_affected: Option<u64>,
}

impl ExecutionOutcome {
    pub fn new(rows_affected: Option<u64>) -> Self {
        Self { rows_affected }
    }
}

impl QueryOutcome for ExecutionOutcome {
    fn rows_affected(&self) -> Option<u64> {
        self.rows_affected
    }
}

/// Builds the [`AdapterResponse`] for a statement outcome.
///
/// Missing outcomes and missing row counts both report zero rows.
pub fn get_response<O>(outcome: Option<&O>) -> AdapterResponse
where
    O: QueryOutcome + ?Sized,
{
    let rows_affected = outcome
        .and_then(|outcome| outcome.rows_affected())
        .unwrap_or(0);

    AdapterResponse {
        message: format!("{SUCCESS_CODE} {rows_affected}"),
        code: SUCCESS_CODE.to_string(),
        rows_affected,
    }
}
