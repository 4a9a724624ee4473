use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dialect;

/// A column of a MySQL relation.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MySqlColumn {
    pub name: String,
    pub data_type: String,
}

impl MySqlColumn {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }

    /// Returns the column name quoted as a MySQL identifier.
    pub fn quoted(&self) -> String {
        dialect::quote(&self.name)
    }
}

impl fmt::Debug for MySqlColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<MySqlColumn {} ({})>", self.name, self.data_type)
    }
}

impl fmt::Display for MySqlColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
