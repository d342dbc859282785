//! Nodes of the move tree.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use study_core::{Move, MoveKind, Piece};
use study_engine::{san, Position};

use crate::annotation::Annotation;

/// Opaque handle to a node in a [`MoveTree`](crate::tree::MoveTree).
///
/// Ids are stable across serialization and are never reused within a tree,
/// so they are safe to hold in UI state across edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated move as recorded on a tree edge, with both notations fixed
/// at the moment it was played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub mov: Move,
    /// Origin-destination encoding, e.g. `e2e4` or `a7a8q`.
    pub uci: String,
    /// Standard algebraic notation, e.g. `Nf3` or `exd6`.
    pub san: String,
    /// What the move removed from the board, if anything.
    pub captured: Option<Piece>,
}

impl PlayedMove {
    /// Captures the notations of `mv` before it is applied to `position`.
    pub(crate) fn record(position: &Position, mv: Move) -> PlayedMove {
        let captured = if mv.kind() == MoveKind::EnPassant {
            Some(Piece::Pawn)
        } else {
            position.piece_at(mv.to()).map(|(piece, _)| piece)
        };
        PlayedMove {
            mov: mv,
            uci: mv.to_uci(),
            san: san(position, mv),
            captured,
        }
    }
}

/// A position evaluation attached to a node, typically imported from an
/// external analysis pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Evaluation {
    /// Centipawns from White's point of view.
    Centipawns(i32),
    /// Moves until forced mate, negative when Black is mating.
    Mate(i32),
}

/// Editorial data carried by a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeMetadata {
    pub comment: Option<String>,
    /// Numeric annotation glyphs, by their standard numbers (1 = `!`, 2 = `?`, ...).
    pub glyphs: Vec<u8>,
    pub evaluation: Option<Evaluation>,
    pub author: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// One position in the tree, reached by the recorded move from its parent.
///
/// The root carries no move. Children are ordered; the first child is the
/// main line and the rest are variations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveNode {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) played: Option<PlayedMove>,
    pub(crate) position: Position,
    /// Repetition tuple hash of `position`, fixed at insertion.
    pub(crate) repetition_key: u64,
    pub(crate) metadata: NodeMetadata,
    pub(crate) annotations: Vec<Annotation>,
}

impl MoveNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The move that led here. `None` only on the root.
    pub fn played(&self) -> Option<&PlayedMove> {
        self.played.as_ref()
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn metadata(&self) -> &NodeMetadata {
        &self.metadata
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
