//! SQL dialect conventions the engine asks the adapter about.

/// Character MySQL uses to quote identifiers.
pub const QUOTE_CHARACTER: char = '`';

/// SQL expression returning the current date.
pub fn date_function() -> &'static str {
    "current_date()"
}

/// Column type used when seeding datetime values.
pub fn convert_datetime_type() -> &'static str {
    "datetime"
}

/// Column type used when seeding text values.
pub fn convert_text_type() -> &'static str {
    "string"
}

/// Wraps `identifier` in backticks.
///
/// Backticks inside `identifier` are not escaped.
pub fn quote(identifier: &str) -> String {
    format!("{QUOTE_CHARACTER}{identifier}{QUOTE_CHARACTER}")
}
