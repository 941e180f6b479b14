//! Core types and shared functionality for the lumina offline cache worker.
//!
//! This crate provides:
//! - Request/response snapshots and control message types
//! - The request classifier
//! - The cache store trait and its SQLite implementation
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod events;
pub mod http;

pub use cache::{CacheDb, CacheStore};
pub use classify::{Category, Strategy, classify};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use events::{ClientAction, ControlMessage, Notification, NotificationAction};
pub use http::{Credentials, Request, Response};
