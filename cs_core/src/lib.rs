//! # Config Server Core
//!
//! Shared types and the provider contract for the config server.
//!
//! This crate provides:
//! - The coordinate model addressing one configuration slice
//! - The address shape every backend derives its locations from
//! - The merge engine (service entries override globals)
//! - Two-scope resolution shared by all providers
//! - The `ConfigProvider` trait every backend implements
//!
//! # Best Practices
//!
//! - Uses Rust Edition 2024
//! - Errors come from the shared `errors` taxonomy
//! - No I/O outside of provider implementations

pub mod address;
pub mod merge;
pub mod resolve;
pub mod traits;
pub mod types;

pub use merge::merge;
pub use resolve::resolve_category;
pub use traits::ConfigProvider;
pub use types::{Category, ConfigResult, Coordinate, Properties, PropertyValue, Scope, ServiceRef};
