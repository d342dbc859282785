//! Board decorations attached to tree nodes.

use std::fmt;

use serde::{Deserialize, Serialize};
use study_core::Square;

/// Identifies one annotation within its tree, for targeted removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(pub(crate) u32);

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A decoration owned by the node it was drawn on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub id: AnnotationId,
    pub kind: AnnotationKind,
}

/// The decorations a study surface can draw. Colors and text styles are
/// free-form strings chosen by the content layer; the core only stores them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationKind {
    /// An arrow from one square to another.
    Arrow {
        from: Square,
        to: Square,
        color: String,
    },
    /// A tinted square.
    Highlight { square: Square, color: String },
    /// Free text pinned to a square.
    Text {
        square: Square,
        text: String,
        style: String,
    },
}
