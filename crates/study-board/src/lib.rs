//! The branching study board built on the rules engine.
//!
//! A [`MoveTree`] records every line explored from a starting position as
//! an arena of id-addressed nodes with a cursor, growing only through
//! validated moves. [`Session`] wraps a tree in one of the [`BoardMode`]
//! policies (free exploration, lessons, puzzles, replay) and turns every
//! request into an ordinary result value plus an event list. Trees travel
//! as flat JSON documents through [`codec`], and [`pgn`] renders a tree as
//! PGN-compatible move text.
//!
//! Everything here is synchronous and single-owner: a tree belongs to one
//! session at a time, positions are cheap immutable values, and no call
//! blocks or schedules work.

pub mod annotation;
pub mod codec;
pub mod mode;
pub mod node;
pub mod pgn;
pub mod session;
pub mod step;
pub mod tree;

pub use annotation::{Annotation, AnnotationId, AnnotationKind};
pub use codec::{from_json, to_json, CorruptTree};
pub use mode::BoardMode;
pub use node::{Evaluation, MoveNode, NodeId, NodeMetadata, PlayedMove};
pub use session::{MoveOutcome, MoveReport, Session, SessionEvent};
pub use step::{AutoResponse, StepDescriptor};
pub use tree::MoveTree;
