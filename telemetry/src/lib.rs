//! Logging setup for binaries and tests that embed the adapter.

pub mod tracing;
