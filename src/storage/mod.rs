//! # Storage
//!
//! PostgreSQL connectivity for the vault store: connection string assembly
//! from the provider block and the bounded pool open.

pub mod connection;
pub mod pool;

pub use connection::{build_connection_string, redacted_connection_string, ConnectionTarget};
pub use pool::{open_pool, DbPool, CONNECT_TIMEOUT, PING_TIMEOUT};
