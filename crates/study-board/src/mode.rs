//! Interaction policies for a study session.

use serde::{Deserialize, Serialize};

/// How a session constrains the tree underneath it.
///
/// Modes are pure policy. They carry no state of their own; the
/// [`Session`](crate::session::Session) holds the script and progress.
///
/// | Mode | navigate | branch | accepts moves |
/// |------|----------|--------|---------------|
/// | `FreeExplore` | yes | yes | any legal move |
/// | `Lesson` | no | no | expected moves only, may auto-respond |
/// | `Puzzle` | no | no | solution sequence only, locks when solved |
/// | `Replay` | yes | no | none |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BoardMode {
    #[default]
    FreeExplore,
    Lesson,
    Puzzle,
    Replay,
}

impl BoardMode {
    /// Whether the cursor may be moved freely through the tree.
    pub const fn can_navigate(self) -> bool {
        matches!(self, BoardMode::FreeExplore | BoardMode::Replay)
    }

    /// Whether new variations may be opened and tree edits made.
    pub const fn can_branch(self) -> bool {
        matches!(self, BoardMode::FreeExplore)
    }

    /// Whether the mode accepts moves at all.
    pub const fn accepts_moves(self) -> bool {
        !matches!(self, BoardMode::Replay)
    }

    /// Whether moves are checked against a content script before the
    /// rules engine sees them.
    pub const fn is_scripted(self) -> bool {
        matches!(self, BoardMode::Lesson | BoardMode::Puzzle)
    }
}
