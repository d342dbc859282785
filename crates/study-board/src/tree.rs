//! The branching move history.

use std::collections::HashMap;

use chrono::Utc;
use study_core::{Move, Piece, Square};
use study_engine::{
    game_status, play, validate_with, AmbiguousPromotion, GameStatus, Position, PromotionPolicy,
};

use crate::annotation::{Annotation, AnnotationId, AnnotationKind};
use crate::node::{Evaluation, MoveNode, NodeId, NodeMetadata, PlayedMove};

/// A tree of positions with a cursor, grown one validated move at a time.
///
/// Nodes live in a flat arena keyed by [`NodeId`]; parents are back
/// references, never owning links, so subtree deletion is a plain sweep
/// over the arena. The cursor always resolves to a live node: every
/// operation that removes nodes relocates it to the nearest surviving
/// ancestor first.
///
/// The tree accepts moves only through validation against the cursor
/// position. It knows nothing about modes or scripts; that policy lives in
/// [`Session`](crate::session::Session).
#[derive(Debug, Clone, PartialEq)]
pub struct MoveTree {
    pub(crate) nodes: HashMap<NodeId, MoveNode>,
    pub(crate) root: NodeId,
    pub(crate) cursor: NodeId,
    pub(crate) next_node: u32,
    pub(crate) next_annotation: u32,
}

impl MoveTree {
    /// A tree rooted at the standard starting position.
    pub fn new() -> MoveTree {
        MoveTree::from_position(Position::startpos())
    }

    /// A tree rooted at an arbitrary position.
    pub fn from_position(position: Position) -> MoveTree {
        let root = NodeId(0);
        let node = MoveNode {
            id: root,
            parent: None,
            children: Vec::new(),
            played: None,
            repetition_key: position.repetition_key(),
            metadata: NodeMetadata::default(),
            annotations: Vec::new(),
            position,
        };
        let mut nodes = HashMap::new();
        nodes.insert(root, node);
        MoveTree {
            nodes,
            root,
            cursor: root,
            next_node: 1,
            next_annotation: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn cursor(&self) -> NodeId {
        self.cursor
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&MoveNode> {
        self.nodes.get(&id)
    }

    /// The node under the cursor.
    pub fn current(&self) -> &MoveNode {
        &self.nodes[&self.cursor]
    }

    /// The position under the cursor.
    pub fn position(&self) -> &Position {
        &self.nodes[&self.cursor].position
    }

    fn node_mut(&mut self, id: NodeId) -> &mut MoveNode {
        self.nodes
            .get_mut(&id)
            .expect("tree ids resolve to live nodes")
    }

    /// Validates a move against the cursor position and advances into it.
    ///
    /// Returns the node now under the cursor, or `None` when the move is
    /// not legal. An unnamed promotion resolves to a queen.
    pub fn try_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    ) -> Option<NodeId> {
        self.try_move_with(from, to, promotion, PromotionPolicy::QueenByDefault)
            .unwrap_or(None)
    }

    /// [`try_move`](MoveTree::try_move) with an explicit promotion policy.
    pub fn try_move_with(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
        policy: PromotionPolicy,
    ) -> Result<Option<NodeId>, AmbiguousPromotion> {
        let mv = match validate_with(self.position(), from, to, promotion, policy)? {
            Some(mv) => mv,
            None => return Ok(None),
        };
        Ok(Some(self.append(mv)))
    }

    /// [`try_move`](MoveTree::try_move) from a UCI string such as `e2e4`
    /// or `a7a8q`. Unparseable input counts as an illegal move.
    pub fn try_move_uci(&mut self, uci: &str) -> Option<NodeId> {
        let parsed = Move::from_uci(uci)?;
        self.try_move(parsed.from(), parsed.to(), parsed.kind().promotion())
    }

    fn append(&mut self, mv: Move) -> NodeId {
        let cursor = self.cursor;
        // Replaying a recorded child follows it instead of duplicating.
        let existing = self.nodes[&cursor]
            .children
            .iter()
            .copied()
            .find(|child| self.nodes[child].played.as_ref().map(|p| p.mov) == Some(mv));
        if let Some(child) = existing {
            self.cursor = child;
            return child;
        }

        let before = self.nodes[&cursor].position.clone();
        let played = PlayedMove::record(&before, mv);
        let position = play(&before, mv);
        let id = NodeId(self.next_node);
        self.next_node += 1;
        tracing::debug!(node = %id, parent = %cursor, uci = %played.uci, "recorded move");
        let node = MoveNode {
            id,
            parent: Some(cursor),
            children: Vec::new(),
            played: Some(played),
            repetition_key: position.repetition_key(),
            metadata: NodeMetadata {
                created_at: Some(Utc::now()),
                ..NodeMetadata::default()
            },
            annotations: Vec::new(),
            position,
        };
        self.nodes.insert(id, node);
        self.node_mut(cursor).children.push(id);
        self.cursor = id;
        id
    }

    /// Moves the cursor to `id`. Returns false for an unknown id.
    pub fn go_to(&mut self, id: NodeId) -> bool {
        if self.nodes.contains_key(&id) {
            self.cursor = id;
            true
        } else {
            false
        }
    }

    /// Follows the first child. Returns false at a leaf.
    pub fn forward(&mut self) -> bool {
        match self.nodes[&self.cursor].children.first() {
            Some(&child) => {
                self.cursor = child;
                true
            }
            None => false,
        }
    }

    /// Steps to the parent. Returns false at the root.
    pub fn back(&mut self) -> bool {
        match self.nodes[&self.cursor].parent {
            Some(parent) => {
                self.cursor = parent;
                true
            }
            None => false,
        }
    }

    pub fn to_start(&mut self) {
        self.cursor = self.root;
    }

    /// Follows first children from the cursor to the end of the line.
    pub fn to_end(&mut self) {
        while self.forward() {}
    }

    /// Makes `id` the first of its parent's children, so main-line
    /// traversal follows it. Sibling order elsewhere is untouched.
    /// Returns false for the root or an unknown id.
    pub fn promote_variation(&mut self, id: NodeId) -> bool {
        let parent = match self.nodes.get(&id).and_then(|node| node.parent) {
            Some(parent) => parent,
            None => return false,
        };
        let children = &mut self.node_mut(parent).children;
        if let Some(index) = children.iter().position(|&child| child == id) {
            children[..=index].rotate_right(1);
        }
        tracing::debug!(node = %id, "promoted variation");
        true
    }

    /// Removes `id` and its whole subtree. A cursor inside the subtree
    /// relocates to the deleted node's parent. The root cannot be deleted;
    /// that returns false, as does an unknown id.
    pub fn delete_variation(&mut self, id: NodeId) -> bool {
        let parent = match self.nodes.get(&id).and_then(|node| node.parent) {
            Some(parent) => parent,
            None => return false,
        };
        self.node_mut(parent).children.retain(|&child| child != id);
        let mut cursor_removed = false;
        let mut removed = 0usize;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                if next == self.cursor {
                    cursor_removed = true;
                }
                stack.extend(node.children);
                removed += 1;
            }
        }
        if cursor_removed {
            self.cursor = parent;
        }
        tracing::debug!(node = %id, removed, "deleted variation");
        true
    }

    /// Root-to-leaf path following first children.
    pub fn main_line(&self) -> Vec<NodeId> {
        let mut line = vec![self.root];
        let mut current = self.root;
        while let Some(&child) = self.nodes[&current].children.first() {
            line.push(child);
            current = child;
        }
        line
    }

    /// Repetition keys of the path from the root to `id`, inclusive.
    pub(crate) fn history_keys(&self, id: NodeId) -> Vec<u64> {
        let mut keys = Vec::new();
        let mut current = Some(id);
        while let Some(at) = current {
            let node = &self.nodes[&at];
            keys.push(node.repetition_key);
            current = node.parent;
        }
        keys.reverse();
        keys
    }

    /// Game status at the cursor, with threefold counted over the path
    /// from the root.
    pub fn status(&self) -> GameStatus {
        game_status(self.position(), &self.history_keys(self.cursor))
    }

    /// Game status at an arbitrary node.
    pub fn status_at(&self, id: NodeId) -> Option<GameStatus> {
        let node = self.nodes.get(&id)?;
        Some(game_status(&node.position, &self.history_keys(id)))
    }

    pub fn set_comment(&mut self, id: NodeId, comment: Option<String>) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.metadata.comment = comment;
                true
            }
            None => false,
        }
    }

    pub fn set_glyphs(&mut self, id: NodeId, glyphs: Vec<u8>) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.metadata.glyphs = glyphs;
                true
            }
            None => false,
        }
    }

    pub fn set_evaluation(&mut self, id: NodeId, evaluation: Option<Evaluation>) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.metadata.evaluation = evaluation;
                true
            }
            None => false,
        }
    }

    pub fn set_author(&mut self, id: NodeId, author: Option<String>) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.metadata.author = author;
                true
            }
            None => false,
        }
    }

    /// Attaches a decoration to a node and returns its id for later
    /// removal. `None` for an unknown node.
    pub fn annotate(&mut self, id: NodeId, kind: AnnotationKind) -> Option<AnnotationId> {
        let annotation = AnnotationId(self.next_annotation);
        let node = self.nodes.get_mut(&id)?;
        node.annotations.push(Annotation {
            id: annotation,
            kind,
        });
        self.next_annotation += 1;
        Some(annotation)
    }

    /// Removes one decoration. False when the node or the annotation is
    /// unknown.
    pub fn remove_annotation(&mut self, id: NodeId, annotation: AnnotationId) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                let before = node.annotations.len();
                node.annotations.retain(|a| a.id != annotation);
                node.annotations.len() != before
            }
            None => false,
        }
    }
}

impl Default for MoveTree {
    fn default() -> MoveTree {
        MoveTree::new()
    }
}
