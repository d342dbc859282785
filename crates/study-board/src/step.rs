//! Step descriptors handed over by the content pipeline.

use serde::{Deserialize, Serialize};

use crate::mode::BoardMode;

/// One exercise step as authored: a starting position, the mode to run it
/// in, and the script the mode enforces.
///
/// Field names mirror the authoring format. Schema validation belongs to
/// the content pipeline; this type only reads the fields it understands
/// and ignores the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDescriptor {
    /// FEN of the position the step starts from.
    pub starting_position: String,
    pub board_mode: BoardMode,
    /// UCI moves the learner may play (Lesson: any of them) or must play
    /// in order, interleaved with replies (Puzzle).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expected_moves: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_respond: Option<AutoResponse>,
}

/// A scripted reply played by the board after a correct learner move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoResponse {
    /// The reply in UCI notation.
    #[serde(rename = "move")]
    pub uci: String,
    /// Presentation delay in milliseconds. Recorded for the caller; the
    /// core itself never waits.
    #[serde(rename = "delay", default)]
    pub delay_ms: u64,
}
