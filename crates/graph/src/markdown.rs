//! Markdown (de)serialization of a single note.
//!
//! ```text
//! ---
//! title: Parent
//! color: blue
//! position: { x: 10.0, y: 20.0 }
//! ---
//! Body text, possibly with [[inline links]].
//!
//! -----------------
//! _Links:_
//! - is_a_child_of [[root.md]]
//! - [[other]]
//! ```
//!
//! The reducer, resolver and healing never see this format: parsing happens
//! strictly upstream of them.

use crate::error::Result;
use crate::types::{default_title, Edge, Node, NodeMetadata, Position};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::{Mapping, Value};

const LINKS_MARKER: &str = "_Links:_";
const LINKS_SEPARATOR: &str = "-----------------";

static FRONTMATTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ms)\A---[ \t]*\r?\n(.*?)(?:\r?\n)?^---[ \t]*\r?(?:\n|\z)").expect("frontmatter regex")
});

static WIKILINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\[\]]+?)\]\]").expect("wikilink regex"));

static LIST_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[-*+]\s+(.+?)\s*$").expect("list label regex"));

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#\s+(.+?)\s*$").expect("heading regex"));

/// Parse raw file contents into a node with unresolved (raw) edge targets.
pub fn parse_markdown_node(id: &str, raw: &str) -> Node {
    let (frontmatter, body) = split_frontmatter(id, raw);
    let content_part = content_before_links(body);

    let outgoing_edges = extract_edges(body);
    let content = strip_inline_links(content_part);

    let mut metadata = frontmatter.map(|fm| metadata_from_frontmatter(id, fm)).unwrap_or_default();
    if metadata.title.is_empty() {
        metadata.title = HEADING
            .captures(&content)
            .and_then(|caps| caps.get(1))
            .map(|heading| heading.as_str().to_string())
            .unwrap_or_else(|| default_title(id));
    }

    Node {
        id: id.to_string(),
        content,
        outgoing_edges,
        metadata,
    }
}

fn split_frontmatter<'a>(id: &str, raw: &'a str) -> (Option<Mapping>, &'a str) {
    let Some(caps) = FRONTMATTER.captures(raw) else {
        return (None, raw);
    };
    let (Some(whole), Some(yaml)) = (caps.get(0), caps.get(1)) else {
        return (None, raw);
    };
    let body = &raw[whole.end()..];

    match serde_yaml::from_str::<Value>(yaml.as_str()) {
        Ok(Value::Mapping(mapping)) => (Some(mapping), body),
        Ok(Value::Null) => (None, body),
        Ok(_) => {
            log::warn!("Frontmatter of {id} is not a mapping; ignoring it");
            (None, body)
        }
        Err(err) => {
            log::warn!("Invalid frontmatter in {id}: {err}");
            (None, body)
        }
    }
}

fn metadata_from_frontmatter(id: &str, frontmatter: Mapping) -> NodeMetadata {
    let mut metadata = NodeMetadata::default();

    for (key, value) in frontmatter {
        let Some(key) = key.as_str().map(str::to_string) else {
            log::debug!("Skipping non-string frontmatter key in {id}");
            continue;
        };
        match key.as_str() {
            "title" => match value.as_str() {
                Some(title) => metadata.title = title.trim().to_string(),
                None => log::debug!("Non-string title in {id} ignored"),
            },
            "color" => metadata.color = value.as_str().map(str::to_string),
            "position" => match serde_yaml::from_value::<Position>(value) {
                Ok(position) => metadata.position = Some(position),
                Err(err) => log::warn!("Invalid position in {id}: {err}"),
            },
            "isContextNode" => metadata.is_context_node = value.as_bool().unwrap_or(false),
            _ => match serde_json::to_value(&value) {
                Ok(json) => {
                    metadata.extra_props.insert(key, json);
                }
                Err(err) => log::warn!("Frontmatter key {key} in {id} dropped: {err}"),
            },
        }
    }

    metadata
}

/// Body up to the links section, separator and trailing blank lines removed.
fn content_before_links(body: &str) -> String {
    let lines: Vec<&str> = body.lines().collect();
    let Some(marker) = lines.iter().position(|line| line.trim() == LINKS_MARKER) else {
        return body.to_string();
    };

    let mut end = marker;
    while end > 0 && lines[end - 1].trim().is_empty() {
        end -= 1;
    }
    if end > 0 && is_separator(lines[end - 1]) {
        end -= 1;
    }
    while end > 0 && lines[end - 1].trim().is_empty() {
        end -= 1;
    }

    lines[..end].join("\n")
}

fn is_separator(line: &str) -> bool {
    let line = line.trim();
    line.len() >= 3 && line.chars().all(|c| c == '-')
}

fn extract_edges(body: &str) -> Vec<Edge> {
    let mut edges = Vec::new();
    for line in body.lines() {
        for (position, link) in WIKILINK.captures_iter(line).enumerate() {
            let (Some(whole), Some(inner)) = (link.get(0), link.get(1)) else {
                continue;
            };
            let target = link_target(inner.as_str());
            if target.is_empty() {
                continue;
            }
            let label = if position == 0 {
                list_label(&line[..whole.start()])
            } else {
                String::new()
            };
            edges.push(Edge::new(target, label));
        }
    }
    edges
}

fn link_target(inner: &str) -> String {
    let target = inner.split('|').next().unwrap_or(inner);
    let target = target.split('#').next().unwrap_or(target);
    target.trim().to_string()
}

fn list_label(prefix: &str) -> String {
    LIST_LABEL
        .captures(prefix)
        .and_then(|caps| caps.get(1))
        .map(|label| label.as_str().replace('_', " ").trim().to_string())
        .unwrap_or_default()
}

fn strip_inline_links(content: String) -> String {
    let replaced = WIKILINK.replace_all(&content, |caps: &regex::Captures<'_>| {
        let inner = caps.get(1).map_or("", |m| m.as_str());
        match inner.split_once('|') {
            Some((_, alias)) => alias.trim().to_string(),
            None => inner.trim().to_string(),
        }
    });
    replaced.trim_start_matches(['\r', '\n']).trim_end().to_string()
}

/// Serialize `node` back to markdown: frontmatter, content, links section.
pub fn render_markdown_node(node: &Node) -> Result<String> {
    let mut frontmatter = Mapping::new();
    frontmatter.insert("title".into(), node.metadata.title.clone().into());
    if let Some(color) = &node.metadata.color {
        frontmatter.insert("color".into(), color.clone().into());
    }
    if let Some(position) = &node.metadata.position {
        frontmatter.insert("position".into(), serde_yaml::to_value(position)?);
    }
    if node.metadata.is_context_node {
        frontmatter.insert("isContextNode".into(), true.into());
    }
    for (key, value) in &node.metadata.extra_props {
        frontmatter.insert(key.clone().into(), serde_yaml::to_value(value)?);
    }

    let mut out = String::from("---\n");
    out.push_str(&serde_yaml::to_string(&Value::Mapping(frontmatter))?);
    out.push_str("---\n");
    if !node.content.is_empty() {
        out.push_str(&node.content);
        out.push('\n');
    }

    if !node.outgoing_edges.is_empty() {
        out.push('\n');
        out.push_str(LINKS_SEPARATOR);
        out.push('\n');
        out.push_str(LINKS_MARKER);
        out.push('\n');
        for edge in &node.outgoing_edges {
            if edge.label.is_empty() {
                out.push_str(&format!("- [[{}]]\n", edge.target_id));
            } else {
                out.push_str(&format!("- {} [[{}]]\n", edge.label.replace(' ', "_"), edge.target_id));
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn frontmatter_fields_and_extra_props() {
        let raw = "---\ntitle: Parent\ncolor: blue\nposition:\n  x: 10\n  y: 20.5\nisContextNode: true\nnode_id: 7\n---\nBody";
        let node = parse_markdown_node("p.md", raw);

        assert_eq!(node.metadata.title, "Parent");
        assert_eq!(node.metadata.color.as_deref(), Some("blue"));
        assert_eq!(node.metadata.position, Some(Position::new(10.0, 20.5)));
        assert!(node.metadata.is_context_node);
        assert_eq!(node.metadata.extra_props["node_id"], serde_json::json!(7));
        assert_eq!(node.content, "Body");
    }

    #[test]
    fn invalid_frontmatter_is_ignored() {
        let node = parse_markdown_node("notes/x.md", "---\ntitle: [unclosed\n---\nText");
        assert_eq!(node.metadata.title, "x");
        assert_eq!(node.content, "Text");
    }

    #[test]
    fn title_falls_back_to_heading_then_stem() {
        assert_eq!(parse_markdown_node("a.md", "# Big Idea\nmore").metadata.title, "Big Idea");
        assert_eq!(parse_markdown_node("dir/a.md", "no heading").metadata.title, "a");
    }

    #[test]
    fn links_become_edges_in_document_order() {
        let raw = "See [[b]] and [[c|the c note]] plus [[d#Intro]] and [[]]\n\n-----------------\n_Links:_\n- is_a_child_of [[root.md]]\n- [[b]]\n";
        let node = parse_markdown_node("a.md", raw);

        assert_eq!(
            node.outgoing_edges,
            vec![
                Edge::to("b"),
                Edge::to("c"),
                Edge::to("d"),
                Edge::new("root.md", "is a child of"),
                Edge::to("b"),
            ]
        );
        assert_eq!(node.content, "See b and the c note plus d#Intro and [[]]");
    }

    #[test]
    fn list_label_applies_to_first_link_only() {
        let node = parse_markdown_node("a.md", "* extends [[x]] and [[y]]");
        assert_eq!(node.outgoing_edges, vec![Edge::new("x", "extends"), Edge::to("y")]);
    }

    #[test]
    fn rendered_node_parses_back() {
        let mut node = Node::new("a.md", "Some body\n\nsecond paragraph")
            .with_title("A title")
            .with_position(Position::new(1.5, -2.0))
            .with_edges([Edge::new("b.md", "depends on"), Edge::to("raw link")]);
        node.metadata.color = Some("red".to_string());
        node.metadata
            .extra_props
            .insert("agent".to_string(), serde_json::json!("writer"));

        let rendered = render_markdown_node(&node).unwrap();
        assert!(rendered.contains("- depends_on [[b.md]]"));
        assert!(rendered.contains("- [[raw link]]"));

        let parsed = parse_markdown_node("a.md", &rendered);
        assert_eq!(parsed, node);
    }

    #[test]
    fn node_without_edges_has_no_links_section() {
        let rendered = render_markdown_node(&Node::new("a.md", "body")).unwrap();
        assert_eq!(rendered, "---\ntitle: a\n---\nbody\n");
    }
}
