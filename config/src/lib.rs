//! Configuration types shared by the MySQL adapter crates.
//!
//! Holds the connection credentials, connect-time settings and the layered
//! configuration loader used by binaries embedding the adapter.

mod environment;
mod load;
pub mod shared;

pub use environment::Environment;
pub use load::{Config, LoadConfigError, load_config};
