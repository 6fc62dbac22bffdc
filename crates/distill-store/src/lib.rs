//! Distill Store - Key-value persistence port and adapters
//!
//! The engine persists quota counters and drafts through the opaque
//! `KeyValueStore` port. Adapters are provided for in-process use and for
//! JSON files on disk.

pub mod file;
pub mod memory;
pub mod ports;

pub use file::JsonFileStore;
pub use memory::MemoryKeyValueStore;
pub use ports::{get_json, put_json, KeyValueStore};
