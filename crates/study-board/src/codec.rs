//! Tree persistence as a flat JSON document.
//!
//! The durable format is a node table plus a root id, a cursor id, and the
//! id counters. Every node carries its parent id, ordered child ids, the
//! move in UCI, its SAN, and the resulting FEN, so a document is readable
//! without replaying the game. Unknown per-node fields are ignored on load,
//! which keeps old readers working as the format grows.
//!
//! Loading validates the whole document before a single node is rebuilt: a
//! tree is loaded intact or refused with [`CorruptTree`], never silently
//! repaired.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use study_core::{Move, Square};
use study_engine::{validate, Position, PositionError};
use thiserror::Error;

use crate::annotation::{Annotation, AnnotationId, AnnotationKind};
use crate::node::{Evaluation, MoveNode, NodeId, NodeMetadata, PlayedMove};
use crate::tree::MoveTree;

/// Why a serialized tree document was refused.
#[derive(Debug, Error)]
pub enum CorruptTree {
    #[error("tree document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tree document has no nodes")]
    Empty,
    #[error("node {0} appears more than once")]
    DuplicateNode(u32),
    #[error("root id {0} does not match any node")]
    UnknownRoot(u32),
    #[error("cursor id {0} does not match any node")]
    UnknownCursor(u32),
    #[error("node {node} references missing node {missing}")]
    Dangling { node: u32, missing: u32 },
    #[error("node {parent} lists child {child} twice")]
    DuplicateChild { parent: u32, child: u32 },
    #[error("node {child} and node {parent} disagree about their link")]
    MismatchedParent { child: u32, parent: u32 },
    #[error("node {0} has no parent and is not the root")]
    Orphan(u32),
    #[error("node {0} is unreachable from the root")]
    Unreachable(u32),
    #[error("root node {0} must not carry a parent or a move")]
    MalformedRoot(u32),
    #[error("node {0} is missing its move")]
    MissingMove(u32),
    #[error("node {node} holds an unusable position: {source}")]
    BadPosition {
        node: u32,
        #[source]
        source: PositionError,
    },
    #[error("node {node}: move {uci} is not legal from its parent")]
    BadMove { node: u32, uci: String },
    #[error("node {node}: {text:?} is not a square")]
    BadSquare { node: u32, text: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct TreeDoc {
    root: u32,
    cursor: u32,
    /// Next free node id. Persisted so ids handed out after a reload never
    /// collide with ids handed out before the save.
    #[serde(default)]
    next_node: u32,
    #[serde(default)]
    next_annotation: u32,
    nodes: Vec<NodeRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NodeRecord {
    id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uci: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    san: Option<String>,
    fen: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    glyphs: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    evaluation: Option<Evaluation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    annotations: Vec<AnnotationRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnnotationRecord {
    id: u32,
    #[serde(flatten)]
    kind: AnnotationKindRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnnotationKindRecord {
    Arrow {
        from: String,
        to: String,
        color: String,
    },
    Highlight {
        square: String,
        color: String,
    },
    Text {
        square: String,
        text: String,
        style: String,
    },
}

/// Serializes a tree to the durable JSON document.
pub fn to_json(tree: &MoveTree) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&doc_from_tree(tree))
}

/// Loads a tree from the durable JSON document.
pub fn from_json(text: &str) -> Result<MoveTree, CorruptTree> {
    let doc: TreeDoc = serde_json::from_str(text)?;
    tree_from_doc(doc)
}

fn doc_from_tree(tree: &MoveTree) -> TreeDoc {
    let mut nodes = Vec::with_capacity(tree.node_count());
    let mut queue = VecDeque::from([tree.root()]);
    while let Some(id) = queue.pop_front() {
        if let Some(node) = tree.node(id) {
            nodes.push(record_from_node(node));
            queue.extend(node.children().iter().copied());
        }
    }
    TreeDoc {
        root: tree.root().0,
        cursor: tree.cursor().0,
        next_node: tree.next_node,
        next_annotation: tree.next_annotation,
        nodes,
    }
}

fn record_from_node(node: &MoveNode) -> NodeRecord {
    NodeRecord {
        id: node.id().0,
        parent: node.parent().map(|id| id.0),
        children: node.children().iter().map(|id| id.0).collect(),
        uci: node.played().map(|played| played.uci.clone()),
        san: node.played().map(|played| played.san.clone()),
        fen: node.position().to_fen(),
        comment: node.metadata().comment.clone(),
        glyphs: node.metadata().glyphs.clone(),
        evaluation: node.metadata().evaluation,
        author: node.metadata().author.clone(),
        created_at: node.metadata().created_at,
        annotations: node.annotations().iter().map(record_from_annotation).collect(),
    }
}

fn record_from_annotation(annotation: &Annotation) -> AnnotationRecord {
    let kind = match &annotation.kind {
        AnnotationKind::Arrow { from, to, color } => AnnotationKindRecord::Arrow {
            from: from.to_algebraic(),
            to: to.to_algebraic(),
            color: color.clone(),
        },
        AnnotationKind::Highlight { square, color } => AnnotationKindRecord::Highlight {
            square: square.to_algebraic(),
            color: color.clone(),
        },
        AnnotationKind::Text {
            square,
            text,
            style,
        } => AnnotationKindRecord::Text {
            square: square.to_algebraic(),
            text: text.clone(),
            style: style.clone(),
        },
    };
    AnnotationRecord {
        id: annotation.id.0,
        kind,
    }
}

fn tree_from_doc(doc: TreeDoc) -> Result<MoveTree, CorruptTree> {
    if doc.nodes.is_empty() {
        return Err(CorruptTree::Empty);
    }
    let mut records: HashMap<u32, NodeRecord> = HashMap::with_capacity(doc.nodes.len());
    for record in doc.nodes {
        let id = record.id;
        if records.insert(id, record).is_some() {
            return Err(CorruptTree::DuplicateNode(id));
        }
    }
    if !records.contains_key(&doc.root) {
        return Err(CorruptTree::UnknownRoot(doc.root));
    }
    if !records.contains_key(&doc.cursor) {
        return Err(CorruptTree::UnknownCursor(doc.cursor));
    }

    // Both link directions must agree before anything is rebuilt.
    for (&id, record) in &records {
        match record.parent {
            None => {
                if id != doc.root {
                    return Err(CorruptTree::Orphan(id));
                }
            }
            Some(parent) => {
                if id == doc.root {
                    return Err(CorruptTree::MalformedRoot(id));
                }
                let listed = records
                    .get(&parent)
                    .ok_or(CorruptTree::Dangling {
                        node: id,
                        missing: parent,
                    })?
                    .children
                    .contains(&id);
                if !listed {
                    return Err(CorruptTree::MismatchedParent { child: id, parent });
                }
            }
        }
        let mut seen = HashSet::new();
        for &child in &record.children {
            if !seen.insert(child) {
                return Err(CorruptTree::DuplicateChild { parent: id, child });
            }
            let claimed = records
                .get(&child)
                .ok_or(CorruptTree::Dangling {
                    node: id,
                    missing: child,
                })?
                .parent;
            if claimed != Some(id) {
                return Err(CorruptTree::MismatchedParent { child, parent: id });
            }
        }
    }

    // With links consistent, anything the root cannot reach is detached or
    // part of a cycle.
    let mut visited = HashSet::from([doc.root]);
    let mut queue = VecDeque::from([doc.root]);
    while let Some(id) = queue.pop_front() {
        for &child in &records[&id].children {
            if visited.insert(child) {
                queue.push_back(child);
            }
        }
    }
    if visited.len() != records.len() {
        let stray = records
            .keys()
            .copied()
            .filter(|id| !visited.contains(id))
            .min()
            .unwrap_or(doc.root);
        return Err(CorruptTree::Unreachable(stray));
    }

    // Rebuild top-down. Stored positions are trusted as written; the move
    // on each edge is revalidated against the parent so a document cannot
    // smuggle in an illegal transition.
    let mut nodes: HashMap<NodeId, MoveNode> = HashMap::with_capacity(records.len());
    let mut queue = VecDeque::from([doc.root]);
    while let Some(id) = queue.pop_front() {
        let record = &records[&id];
        let position = Position::from_fen(&record.fen)
            .map_err(|source| CorruptTree::BadPosition { node: id, source })?;
        let played = match record.parent {
            None => {
                if record.uci.is_some() {
                    return Err(CorruptTree::MalformedRoot(id));
                }
                None
            }
            Some(parent) => {
                let uci = record.uci.as_deref().ok_or(CorruptTree::MissingMove(id))?;
                let parent_position = &nodes[&NodeId(parent)].position;
                let mv = Move::from_uci(uci)
                    .and_then(|m| validate(parent_position, m.from(), m.to(), m.kind().promotion()))
                    .ok_or_else(|| CorruptTree::BadMove {
                        node: id,
                        uci: uci.to_string(),
                    })?;
                let mut played = PlayedMove::record(parent_position, mv);
                if let Some(san) = &record.san {
                    played.san = san.clone();
                }
                Some(played)
            }
        };
        let annotations = record
            .annotations
            .iter()
            .cloned()
            .map(|a| annotation_from_record(a, id))
            .collect::<Result<Vec<_>, CorruptTree>>()?;
        let node = MoveNode {
            id: NodeId(id),
            parent: record.parent.map(NodeId),
            children: record.children.iter().copied().map(NodeId).collect(),
            played,
            repetition_key: position.repetition_key(),
            metadata: NodeMetadata {
                comment: record.comment.clone(),
                glyphs: record.glyphs.clone(),
                evaluation: record.evaluation,
                author: record.author.clone(),
                created_at: record.created_at,
            },
            annotations,
            position,
        };
        nodes.insert(NodeId(id), node);
        queue.extend(record.children.iter().copied());
    }

    // Stored counters win, but never below one past the highest id in use;
    // documents from before the counters were recorded default to that
    // floor.
    let next_node = records
        .keys()
        .max()
        .map_or(0, |max| max.saturating_add(1))
        .max(doc.next_node);
    let next_annotation = records
        .values()
        .flat_map(|record| record.annotations.iter().map(|a| a.id))
        .max()
        .map_or(0, |max| max.saturating_add(1))
        .max(doc.next_annotation);
    Ok(MoveTree {
        nodes,
        root: NodeId(doc.root),
        cursor: NodeId(doc.cursor),
        next_node,
        next_annotation,
    })
}

fn annotation_from_record(record: AnnotationRecord, node: u32) -> Result<Annotation, CorruptTree> {
    let kind = match record.kind {
        AnnotationKindRecord::Arrow { from, to, color } => AnnotationKind::Arrow {
            from: parse_square(node, &from)?,
            to: parse_square(node, &to)?,
            color,
        },
        AnnotationKindRecord::Highlight { square, color } => AnnotationKind::Highlight {
            square: parse_square(node, &square)?,
            color,
        },
        AnnotationKindRecord::Text {
            square,
            text,
            style,
        } => AnnotationKind::Text {
            square: parse_square(node, &square)?,
            text,
            style,
        },
    };
    Ok(Annotation {
        id: AnnotationId(record.id),
        kind,
    })
}

fn parse_square(node: u32, text: &str) -> Result<Square, CorruptTree> {
    Square::from_algebraic(text).ok_or_else(|| CorruptTree::BadSquare {
        node,
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::START_FEN;

    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn round_trip_preserves_structure_metadata_and_cursor() {
        let mut tree = MoveTree::new();
        let e4 = tree.try_move_uci("e2e4").unwrap();
        let e5 = tree.try_move_uci("e7e5").unwrap();
        tree.back();
        let c5 = tree.try_move_uci("c7c5").unwrap();
        tree.back();
        tree.try_move_uci("e7e6").unwrap();
        tree.set_comment(c5, Some("the Sicilian".into()));
        tree.set_glyphs(c5, vec![1, 14]);
        tree.set_evaluation(e4, Some(Evaluation::Centipawns(30)));
        tree.set_author(e4, Some("coach".into()));
        tree.annotate(
            e4,
            AnnotationKind::Arrow {
                from: sq("g1"),
                to: sq("f3"),
                color: "green".into(),
            },
        );
        tree.annotate(
            c5,
            AnnotationKind::Text {
                square: sq("d4"),
                text: "hole".into(),
                style: "warning".into(),
            },
        );
        tree.go_to(e5);

        let json = to_json(&tree).unwrap();
        let restored = from_json(&json).unwrap();
        assert_eq!(restored, tree);
        assert_eq!(restored.cursor(), e5);

        // Fresh ids on a restored tree do not collide with loaded ones.
        let mut grown = restored;
        grown.to_start();
        let fresh = grown.try_move_uci("d2d4").unwrap();
        assert!(tree.node(fresh).is_none());
    }

    #[test]
    fn restored_trees_never_reissue_ids_deleted_before_the_save() {
        let mut tree = MoveTree::new();
        let e4 = tree.try_move_uci("e2e4").unwrap();
        let e5 = tree.try_move_uci("e7e5").unwrap();
        tree.delete_variation(e5);

        let mut restored = from_json(&to_json(&tree).unwrap()).unwrap();
        assert_eq!(restored, tree);
        restored.go_to(e4);
        let fresh = restored.try_move_uci("g8f6").unwrap();
        assert_ne!(fresh, e5);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let json = format!(
            r#"{{
                "root": 0, "cursor": 1, "schema_version": 9,
                "nodes": [
                    {{"id": 0, "children": [1], "fen": "{START_FEN}", "mood": "calm"}},
                    {{"id": 1, "parent": 0, "uci": "e2e4", "fen": "{AFTER_E4}", "clock_ms": 3000}}
                ]
            }}"#
        );
        let tree = from_json(&json).unwrap();
        assert_eq!(tree.node_count(), 2);
        assert_eq!(tree.cursor(), NodeId(1));
    }

    #[test]
    fn missing_san_is_regenerated() {
        let json = format!(
            r#"{{
                "root": 0, "cursor": 0,
                "nodes": [
                    {{"id": 0, "children": [1], "fen": "{START_FEN}"}},
                    {{"id": 1, "parent": 0, "uci": "e2e4", "fen": "{AFTER_E4}"}}
                ]
            }}"#
        );
        let tree = from_json(&json).unwrap();
        let node = tree.node(NodeId(1)).unwrap();
        assert_eq!(node.played().unwrap().san, "e4");
        assert_eq!(node.played().unwrap().uci, "e2e4");
    }

    #[test]
    fn dangling_child_is_refused() {
        let json = format!(
            r#"{{"root": 0, "cursor": 0, "nodes": [
                {{"id": 0, "children": [7], "fen": "{START_FEN}"}}
            ]}}"#
        );
        assert!(matches!(
            from_json(&json),
            Err(CorruptTree::Dangling { node: 0, missing: 7 })
        ));
    }

    #[test]
    fn one_sided_links_are_refused() {
        // Node 1 claims the root as parent, but the root does not list it.
        let json = format!(
            r#"{{"root": 0, "cursor": 0, "nodes": [
                {{"id": 0, "fen": "{START_FEN}"}},
                {{"id": 1, "parent": 0, "uci": "e2e4", "fen": "{AFTER_E4}"}}
            ]}}"#
        );
        assert!(matches!(
            from_json(&json),
            Err(CorruptTree::MismatchedParent { child: 1, parent: 0 })
        ));
    }

    #[test]
    fn cycles_are_unreachable_and_refused() {
        // Nodes 1 and 2 form a consistent two-cycle off to the side.
        let json = format!(
            r#"{{"root": 0, "cursor": 0, "nodes": [
                {{"id": 0, "fen": "{START_FEN}"}},
                {{"id": 1, "parent": 2, "children": [2], "uci": "e2e4", "fen": "{AFTER_E4}"}},
                {{"id": 2, "parent": 1, "children": [1], "uci": "e7e5", "fen": "{AFTER_E4}"}}
            ]}}"#
        );
        assert!(matches!(from_json(&json), Err(CorruptTree::Unreachable(1))));
    }

    #[test]
    fn unknown_cursor_is_refused() {
        let json = format!(
            r#"{{"root": 0, "cursor": 5, "nodes": [{{"id": 0, "fen": "{START_FEN}"}}]}}"#
        );
        assert!(matches!(from_json(&json), Err(CorruptTree::UnknownCursor(5))));
    }

    #[test]
    fn an_empty_document_is_refused() {
        let json = r#"{"root": 0, "cursor": 0, "nodes": []}"#;
        assert!(matches!(from_json(json), Err(CorruptTree::Empty)));
    }

    #[test]
    fn duplicate_ids_are_refused() {
        let json = format!(
            r#"{{"root": 0, "cursor": 0, "nodes": [
                {{"id": 0, "fen": "{START_FEN}"}},
                {{"id": 0, "fen": "{START_FEN}"}}
            ]}}"#
        );
        assert!(matches!(from_json(&json), Err(CorruptTree::DuplicateNode(0))));
    }

    #[test]
    fn illegal_stored_moves_are_refused() {
        let json = format!(
            r#"{{"root": 0, "cursor": 0, "nodes": [
                {{"id": 0, "children": [1], "fen": "{START_FEN}"}},
                {{"id": 1, "parent": 0, "uci": "e2e5", "fen": "{START_FEN}"}}
            ]}}"#
        );
        assert!(matches!(
            from_json(&json),
            Err(CorruptTree::BadMove { node: 1, .. })
        ));
    }

    #[test]
    fn unparseable_positions_are_refused() {
        let json = r#"{"root": 0, "cursor": 0, "nodes": [{"id": 0, "fen": "not a fen"}]}"#;
        assert!(matches!(
            from_json(json),
            Err(CorruptTree::BadPosition { node: 0, .. })
        ));
    }

    #[test]
    fn a_root_with_a_move_is_refused() {
        let json = format!(
            r#"{{"root": 0, "cursor": 0, "nodes": [
                {{"id": 0, "uci": "e2e4", "fen": "{START_FEN}"}}
            ]}}"#
        );
        assert!(matches!(from_json(&json), Err(CorruptTree::MalformedRoot(0))));
    }

    #[test]
    fn bad_annotation_squares_are_refused() {
        let json = format!(
            r#"{{"root": 0, "cursor": 0, "nodes": [
                {{"id": 0, "fen": "{START_FEN}",
                  "annotations": [{{"id": 0, "type": "highlight", "square": "j9", "color": "red"}}]}}
            ]}}"#
        );
        assert!(matches!(
            from_json(&json),
            Err(CorruptTree::BadSquare { node: 0, .. })
        ));
    }
}
