mod adapter;
mod base;
mod connection;

pub use adapter::*;
pub use base::*;
pub use connection::*;
