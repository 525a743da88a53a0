//! # VoiceTree Indexer
//!
//! Filesystem side of the note graph: finds the notes of a vault, loads them
//! into a [`Graph`](voicetree_graph::Graph), keeps that graph in sync with the
//! disk and writes deltas back.
//!
//! ## Pipeline
//!
//! ```text
//! Vault directory
//!     │
//!     ├──> Vault Scanner (.gitignore aware, exclude globs)
//!     │      └─> Markdown files
//!     │
//!     ├──> Loader (one Added event per file, same mapper as the watcher)
//!     │      └─> VaultSnapshot
//!     │
//!     ├──> Vault Watcher (notify -> single coordinator -> GraphStore)
//!     │      └─> GraphUpdate broadcast
//!     │
//!     └──> Disk Writer (Delta -> markdown files, fail-fast)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use voicetree_indexer::{load_vault, VaultConfig};
//!
//! fn main() -> voicetree_indexer::Result<()> {
//!     let config = VaultConfig::load("/path/to/vault")?;
//!     let snapshot = load_vault(&config)?;
//!
//!     println!("Loaded {} notes", snapshot.graph.len());
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod loader;
mod scanner;
mod store;
mod watcher;
mod writer;

pub use config::{
    config_path, ContextSection, VaultConfig, VaultSection, WatchSection, CONFIG_DIR, CONFIG_FILE,
    MAX_DISTANCE_ENV,
};
pub use error::{IndexerError, Result};
pub use loader::{canonical_root, load_vault, LoadStats, VaultSnapshot};
pub use scanner::VaultScanner;
pub use store::GraphStore;
pub use watcher::{GraphUpdate, VaultWatcher, VaultWatcherConfig};
pub use writer::{DiskWriter, MarkdownDiskWriter};
