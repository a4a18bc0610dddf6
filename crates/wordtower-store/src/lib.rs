//! wordtower-store: Graph store adapters and configuration.
//!
//! Implements the `GraphStore` trait over an in-memory graph, a JSON
//! snapshot file, and a call-counting mock, and loads `wordtower.toml`.

pub mod config;
pub mod file;
pub mod memory;
pub mod mock;

pub use config::{load_config, load_config_from, open_store, StoreConfig, TowerConfig};
pub use file::FileGraph;
pub use memory::MemoryGraph;
pub use mock::MockStore;
