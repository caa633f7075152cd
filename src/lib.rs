//! An async client for an HTTP key-value store
//!
//! This library gives application code typed access to a remote
//! key-value store exposed over a simple HTTP API: per-key GET/POST/DELETE
//! paths plus a prefix-filtered list endpoint. A local read-through cache
//! avoids redundant network round-trips for keys this client has already
//! seen.
//!
//! # Features
//! - Keep-alive connection pooling shared across all client instances
//! - Optional bearer-token authentication via a pluggable provider
//! - Async/await API using tokio
//! - Values stored as JSON with tolerant decoding of legacy plain strings
//! - Single-request batch writes, sequential batch reads and deletes
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use kvdb_client::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), kvdb_client::Error> {
//!     // Or Client::from_env() to read the KVDB_URL variable.
//!     let client = Client::new("https://kv.example.com/v1/mydb")?;
//!
//!     client.set("greeting", "hello").await?;
//!
//!     if let Some(value) = client.get("greeting").await? {
//!         println!("greeting = {:?}", value);
//!     }
//!
//!     let keys = client.list("").await?;
//!     println!("{} keys", keys.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod auth;
pub mod client;
pub mod error;
mod transport;
pub mod types;

pub use auth::{EnvToken, StaticToken, TokenProvider};
pub use client::{Client, URL_ENV_VAR};
pub use error::{Error, Result};
pub use types::Value;
