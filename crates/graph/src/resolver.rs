//! Link resolution by path-segment matching.
//!
//! A wikilink is usually a short form of a note path: `[[1]]` or `[[felix/1]]`
//! for `felix/1.md`. Every known id is expanded into the forms obtained by
//! stripping leading folders and/or the trailing extension, and a raw token
//! resolves to the id whose form it equals with the fewest stripped segments.

use crate::types::{Graph, NodeId};
use std::collections::HashMap;

/// A short form of a node id and how many segments were stripped to get it.
///
/// Each dropped leading folder counts one, a dropped extension counts one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentForm {
    pub form: String,
    pub stripped: usize,
}

/// All forms a link token may take to reference `id`, most specific first.
///
/// `felix/1.md` yields `felix/1.md`, `felix/1`, `1.md`, `1`.
pub fn segment_forms(id: &str) -> Vec<SegmentForm> {
    let segments: Vec<&str> = id.split('/').collect();
    let mut forms = Vec::with_capacity(segments.len() * 2);

    for start in 0..segments.len() {
        let suffix = segments[start..].join("/");
        if suffix.is_empty() {
            continue;
        }
        if let Some(stem) = strip_extension(&suffix) {
            forms.push(SegmentForm {
                form: suffix.clone(),
                stripped: start,
            });
            forms.push(SegmentForm {
                form: stem.to_string(),
                stripped: start + 1,
            });
        } else {
            forms.push(SegmentForm {
                form: suffix,
                stripped: start,
            });
        }
    }

    forms
}

fn strip_extension(path: &str) -> Option<&str> {
    let file_start = path.rfind('/').map_or(0, |slash| slash + 1);
    let dot = path[file_start..].rfind('.')?;
    // A leading dot names a hidden file, not an extension.
    if dot == 0 {
        return None;
    }
    Some(&path[..file_start + dot])
}

/// Outcome of resolving one raw token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub target: NodeId,
    pub stripped: usize,
    /// Other ids matching with the same number of stripped segments
    pub ambiguous_with: Vec<NodeId>,
    /// Every other id the token matches, best ranked first
    pub alternatives: Vec<NodeId>,
}

impl Resolution {
    pub fn is_ambiguous(&self) -> bool {
        !self.ambiguous_with.is_empty()
    }

    /// More than one note answers to the token. A lower ranked one can win
    /// after the others are gone, so the choice may depend on history.
    pub fn has_alternatives(&self) -> bool {
        !self.alternatives.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Candidate {
    stripped: usize,
    id: NodeId,
}

/// Lookup table from every segment form to the ids producing it.
#[derive(Debug, Clone, Default)]
pub struct LinkIndex {
    by_form: HashMap<String, Vec<Candidate>>,
}

impl LinkIndex {
    pub fn new<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = Self::default();
        for id in ids {
            index.insert(id);
        }
        index
    }

    pub fn from_graph(graph: &Graph) -> Self {
        Self::new(graph.ids().map(String::as_str))
    }

    pub fn insert(&mut self, id: &str) {
        for SegmentForm { form, stripped } in segment_forms(id) {
            let candidates = self.by_form.entry(form).or_default();
            let candidate = Candidate {
                stripped,
                id: id.to_string(),
            };
            // Kept sorted by (stripped, id) so the winner is always first.
            if let Err(pos) = candidates.binary_search(&candidate) {
                candidates.insert(pos, candidate);
            }
        }
    }

    /// Best matching id for `raw`, or `None` when the link stays raw.
    pub fn resolve(&self, raw: &str) -> Option<NodeId> {
        self.resolve_detailed(raw).map(|resolution| resolution.target)
    }

    pub fn resolve_detailed(&self, raw: &str) -> Option<Resolution> {
        let token = normalize_token(raw);
        if token.is_empty() {
            return None;
        }
        let candidates = self.by_form.get(token.as_str())?;
        let best = candidates.first()?;
        let ambiguous_with = candidates
            .iter()
            .skip(1)
            .take_while(|candidate| candidate.stripped == best.stripped)
            .map(|candidate| candidate.id.clone())
            .collect();
        let alternatives = candidates
            .iter()
            .skip(1)
            .map(|candidate| candidate.id.clone())
            .collect();
        Some(Resolution {
            target: best.id.clone(),
            stripped: best.stripped,
            ambiguous_with,
            alternatives,
        })
    }
}

fn normalize_token(raw: &str) -> String {
    raw.trim().replace('\\', "/")
}

/// One-shot resolution against an id set. Prefer a [`LinkIndex`] when
/// resolving many links against the same ids.
pub fn resolve_link<'a>(raw: &str, known_ids: impl IntoIterator<Item = &'a str>) -> Option<NodeId> {
    LinkIndex::new(known_ids).resolve(raw)
}

pub fn resolve_link_detailed<'a>(
    raw: &str,
    known_ids: impl IntoIterator<Item = &'a str>,
) -> Option<Resolution> {
    LinkIndex::new(known_ids).resolve_detailed(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn forms(id: &str) -> Vec<String> {
        segment_forms(id).into_iter().map(|f| f.form).collect()
    }

    #[test]
    fn forms_strip_folders_and_extension() {
        assert_eq!(forms("felix/1.md"), vec!["felix/1.md", "felix/1", "1.md", "1"]);
        assert_eq!(forms("plain"), vec!["plain"]);
        assert_eq!(forms("a/.hidden"), vec!["a/.hidden", ".hidden"]);
        assert_eq!(forms("v1.2/note"), vec!["v1.2/note", "note"]);
    }

    #[test]
    fn bare_name_resolves_to_nested_note() {
        let ids = ["felix/1.md", "other.md"];
        assert_eq!(resolve_link("1", ids), Some("felix/1.md".to_string()));
        assert_eq!(resolve_link("felix/1", ids), Some("felix/1.md".to_string()));
        assert_eq!(resolve_link("1.md", ids), Some("felix/1.md".to_string()));
    }

    #[test]
    fn unknown_token_stays_unresolved() {
        assert_eq!(resolve_link("missing", ["a.md"]), None);
        assert_eq!(resolve_link("   ", ["a.md"]), None);
    }

    #[test]
    fn fewest_stripped_segments_wins() {
        let ids = ["felix/1.md", "1.md"];
        let resolution = resolve_link_detailed("1", ids).unwrap();
        assert_eq!(resolution.target, "1.md");
        assert_eq!(resolution.stripped, 1);
        assert!(!resolution.is_ambiguous());
        assert_eq!(resolution.alternatives, vec!["felix/1.md".to_string()]);

        assert_eq!(
            resolve_link("felix/1", ["a/felix/1.md", "felix/1.md"]),
            Some("felix/1.md".to_string())
        );
    }

    #[test]
    fn ties_break_on_sorted_id_and_are_reported() {
        let ids = ["zeta/1.md", "alpha/1.md"];
        let resolution = resolve_link_detailed("1", ids).unwrap();
        assert_eq!(resolution.target, "alpha/1.md");
        assert_eq!(resolution.ambiguous_with, vec!["zeta/1.md".to_string()]);

        let reversed = resolve_link_detailed("1", ["alpha/1.md", "zeta/1.md"]).unwrap();
        assert_eq!(reversed, resolution);
    }

    #[test]
    fn resolved_id_resolves_to_itself() {
        let ids = ["felix/1.md", "1.md"];
        assert_eq!(resolve_link("felix/1.md", ids), Some("felix/1.md".to_string()));
        assert_eq!(resolve_link("1.md", ids), Some("1.md".to_string()));
    }

    #[test]
    fn index_insert_is_idempotent() {
        let mut index = LinkIndex::new(["a.md"]);
        index.insert("a.md");
        let resolution = index.resolve_detailed("a").unwrap();
        assert_eq!(resolution.target, "a.md");
        assert!(resolution.ambiguous_with.is_empty());
        assert!(!resolution.has_alternatives());
    }
}
