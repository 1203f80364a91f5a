//! Session Storage Backends
//!
//! Implementations of [`SessionStorage`](crate::domain::SessionStorage):
//!
//! - `MemoryStorage`: process-local map, used by tests and single-process clients
//! - `FileStorage`: one JSON file per key under a directory, survives restarts

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;
