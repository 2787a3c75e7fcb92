//! Photodrop Storage Library
//!
//! This crate provides the object store behind the relay: the `Storage`
//! trait, a local filesystem backend and an in-memory backend.
//!
//! # Object names
//!
//! The namespace is flat. An object name is a single path segment: it must
//! not be empty, contain `/`, `\` or `..`, or start with `.` (dot-prefixed
//! entries are reserved for in-flight writes). Name generation and
//! validation live in the `keys` module so every backend agrees.

pub mod claim;
pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-memory")]
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use claim::{ClaimRegistry, ObjectClaim};
pub use factory::create_storage;
pub use keys::{extension_of, validate_object_name, ObjectNamer};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-memory")]
pub use memory::MemoryStorage;
pub use photodrop_core::StorageBackend;
pub use traits::{ByteStream, Storage, StorageError, StorageResult};
