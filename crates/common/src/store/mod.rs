//! Key-value storage abstraction
//!
//! The lifecycle manager only needs `get`, `put` with a TTL and `delete`. The
//!  engine behind it (memory, SQLite, a hosted KV service) is injected.

mod memory;
mod provider;

pub use memory::MemoryKvStore;
pub use provider::{KvError, KvStore};
