//! Worker runtime for lumina-sw.
//!
//! This crate provides the network layer, the caching strategies, the
//! lifecycle manager and the event dispatcher used by the server.

pub mod fetch;
pub mod lifecycle;
pub mod offline;
pub mod strategy;
pub mod worker;

#[cfg(test)]
mod testing;

pub use fetch::{FetchClient, FetchConfig, Network};
pub use lifecycle::{LifecycleManager, LifecycleState};
pub use offline::OfflineResponder;
pub use strategy::StrategyEngine;
pub use worker::{FetchOutcome, MessageOutcome, ServiceWorker};
