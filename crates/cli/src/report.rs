use serde::Serialize;
use std::path::Path;
use voicetree_graph::{GraphStats, NodeId, Resolution, TraversalEntry};
use voicetree_indexer::LoadStats;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport<'a> {
    pub root: &'a Path,
    pub load: LoadStats,
    pub graph: GraphStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveReport<'a> {
    pub token: &'a str,
    pub target: Option<&'a NodeId>,
    pub stripped: Option<usize>,
    pub ambiguous_with: &'a [NodeId],
    pub alternatives: &'a [NodeId],
}

impl<'a> ResolveReport<'a> {
    pub fn new(token: &'a str, resolution: Option<&'a Resolution>) -> Self {
        Self {
            token,
            target: resolution.map(|r| &r.target),
            stripped: resolution.map(|r| r.stripped),
            ambiguous_with: resolution
                .map(|r| r.ambiguous_with.as_slice())
                .unwrap_or_default(),
            alternatives: resolution
                .map(|r| r.alternatives.as_slice())
                .unwrap_or_default(),
        }
    }
}

pub fn render_load_summary(report: &LoadReport<'_>) -> String {
    let mut out = String::new();
    out.push_str(&format!("Vault: {}\n", report.root.display()));
    out.push_str(&format!(
        "Notes: {} ({} unreadable) in {}ms\n",
        report.load.files, report.load.unreadable, report.load.duration_ms
    ));
    out.push_str(&format!(
        "Edges: {} ({} dangling)\n",
        report.graph.edges, report.graph.dangling_edges
    ));
    out.push_str(&format!("Roots: {}\n", report.graph.roots));
    out.push_str(&format!("Cycles: {}\n", report.graph.cyclic_components));
    out
}

/// One line per entry, indented two spaces per depth level
pub fn render_order(entries: &[TraversalEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&"  ".repeat(entry.depth));
        out.push_str(&entry.id);
        if !entry.label.is_empty() {
            out.push_str(&format!(" ({})", entry.label));
        }
        out.push('\n');
    }
    out
}

pub fn render_resolution(report: &ResolveReport<'_>) -> String {
    match report.target {
        None => format!("{} -> (unresolved)", report.token),
        Some(target) if report.alternatives.is_empty() => {
            format!("{} -> {target}", report.token)
        }
        Some(target) if report.ambiguous_with.is_empty() => format!(
            "{} -> {target} (ranked over: {})",
            report.token,
            report.alternatives.join(", ")
        ),
        Some(target) => format!(
            "{} -> {target} (also matches: {})",
            report.token,
            report.ambiguous_with.join(", ")
        ),
    }
}
