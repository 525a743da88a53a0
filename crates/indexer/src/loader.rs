use crate::config::VaultConfig;
use crate::error::{IndexerError, Result};
use crate::scanner::VaultScanner;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use voicetree_graph::{apply_delta, FsEventMapper, Graph};
use voicetree_protocol::FsEvent;

/// Graph built from a full pass over the vault
#[derive(Debug, Clone)]
pub struct VaultSnapshot {
    /// Canonical vault root all node ids are relative to
    pub root: PathBuf,
    pub graph: Graph,
    pub stats: LoadStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadStats {
    pub files: usize,
    pub unreadable: usize,
    pub duration_ms: u64,
}

/// Canonical form of the vault root, so scanned paths and watcher paths agree.
pub fn canonical_root(config: &VaultConfig) -> Result<PathBuf> {
    std::fs::canonicalize(&config.root)
        .map_err(|e| IndexerError::InvalidPath(format!("{}: {e}", config.root.display())))
}

/// Read every note and fold it in as an `Added` event, one at a time, through
/// the same mapper the watcher uses.
pub fn load_vault(config: &VaultConfig) -> Result<VaultSnapshot> {
    let start = Instant::now();
    let root = canonical_root(config)?;
    let scanner = VaultScanner::with_excludes(&root, &config.vault.exclude)?;
    let mapper = FsEventMapper::new(&root);

    let mut graph = Graph::new();
    let mut stats = LoadStats::default();
    for path in scanner.scan() {
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                log::warn!("Skipping unreadable note {}: {err}", path.display());
                stats.unreadable += 1;
                continue;
            }
        };
        let delta = mapper.map(&FsEvent::added(path, content), &graph);
        graph = apply_delta(graph, &delta);
        stats.files += 1;
    }

    stats.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    log::info!(
        "Loaded {} notes ({} dangling links) from {} in {}ms",
        graph.len(),
        graph.dangling_edges().len(),
        root.display(),
        stats.duration_ms
    );

    Ok(VaultSnapshot { root, graph, stats })
}
