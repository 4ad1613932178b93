//! Per-module config/credentials vault over a per-user key-value store.
//!
//! A [`vault::ConfigVault`] owns one record (`<module>-config`), tags it with
//! the module's `@context` dialect, optionally seals it with a password, and
//! notifies subscribers when the record changes.

pub mod context;
pub mod error;
pub mod payload;
pub mod registry;
pub mod vault;

pub use error::VaultError;
pub use registry::Subscription;
pub use vault::ConfigVault;
