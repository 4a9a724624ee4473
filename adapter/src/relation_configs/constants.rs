/// Longest identifier the server accepts for tables, views and indexes.
pub const MAX_CHARACTERS_IN_IDENTIFIER: usize = 64;
