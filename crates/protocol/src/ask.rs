//! Request/response contract of the backend "ask" search service.
//!
//! The service itself lives outside this workspace; only the payloads are
//! modelled here so callers can turn hits into node ids.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_TOP_K: usize = 10;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct AskRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl AskRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct AskHit {
    /// Path as reported by the service: absolute or vault-relative.
    pub path: String,
    pub score: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default, JsonSchema)]
pub struct AskResponse {
    #[serde(default)]
    pub relevant_nodes: Vec<AskHit>,
}

impl AskResponse {
    /// Hits as vault-relative node ids, best score first.
    ///
    /// Absolute paths under `vault_root` are made relative; anything else is
    /// passed through with separators normalised.
    #[must_use]
    pub fn node_ids(&self, vault_root: &Path) -> Vec<String> {
        let mut hits: Vec<&AskHit> = self.relevant_nodes.iter().collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.into_iter()
            .map(|hit| {
                let path = Path::new(&hit.path);
                let rel = path.strip_prefix(vault_root).unwrap_or(path);
                rel.to_string_lossy().replace('\\', "/")
            })
            .collect()
    }
}
