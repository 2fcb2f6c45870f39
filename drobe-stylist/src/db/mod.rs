//! Persistence layer

mod kv;

pub use kv::{KeyValueStore, SqliteKeyValueStore};
