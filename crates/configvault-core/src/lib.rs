//! Collaborator contracts for the config vault: the storage-client and
//! cipher seams, schema plumbing, and an in-memory client for tests.

pub mod cipher;
pub mod client;
pub mod memory;
pub mod schema;
