//! # opshub-core
//!
//! Core crate for the OpsHub dashboard. Contains configuration schemas,
//! the plugin manifest and its validator, typed domain events, permission
//! helpers, navigation types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other OpsHub crates.

pub mod config;
pub mod error;
pub mod events;
pub mod manifest;
pub mod permissions;
pub mod result;
pub mod types;

pub use error::AppError;
pub use manifest::{FieldError, PluginManifest, SchemaError};
pub use result::AppResult;
