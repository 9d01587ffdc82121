//! Shared error and configuration types for FinDoc.

pub mod config;
pub mod error;

pub use config::{AppConfig, DataPaths, RemoteConfig};
pub use error::{Error, Result};
