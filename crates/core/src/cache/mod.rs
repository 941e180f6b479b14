//! Namespaced, versioned response cache.
//!
//! The worker only talks to the store through [`CacheStore`], so a host can
//! provide its own. [`CacheDb`] is the SQLite-backed implementation, accessed
//! asynchronously via tokio-rusqlite. It supports:
//!
//! - Namespaces listed in creation order, deleted with all their entries
//! - Entries keyed by a SHA-256 request identity (method + URL)
//! - Atomic multi-entry writes for precaching
//! - Automatic schema migrations

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod store;

use async_trait::async_trait;

pub use crate::Error;
use crate::http::{Request, Response};

pub use connection::CacheDb;

/// Operations the worker needs from a cache store.
///
/// `put` and `match_*` are atomic per entry; concurrent puts to the same key
/// are last-write-wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Create the namespace if it does not exist.
    async fn open(&self, namespace: &str) -> Result<(), Error>;

    /// List namespace names in creation order.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Look up a request in one namespace.
    async fn match_in(&self, namespace: &str, request: &Request) -> Result<Option<Response>, Error>;

    /// Look up a request across all namespaces, oldest namespace first.
    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error>;

    /// Store a response, creating the namespace if needed. Only GET requests can be stored.
    async fn put(&self, namespace: &str, request: &Request, response: &Response) -> Result<(), Error>;

    /// Store several responses in one transaction: all of them or none.
    async fn put_all(&self, namespace: &str, entries: Vec<(Request, Response)>) -> Result<(), Error>;

    /// Delete a namespace and its entries. Returns whether it existed.
    async fn delete(&self, namespace: &str) -> Result<bool, Error>;

    /// URLs stored in a namespace, sorted.
    async fn entries(&self, namespace: &str) -> Result<Vec<String>, Error>;
}
