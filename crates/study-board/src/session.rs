//! Mode-governed sessions over a move tree.
//!
//! A [`Session`] wraps a [`MoveTree`] in one of the [`BoardMode`] policies.
//! Every request runs the same pipeline: board lock and mode capability,
//! then the content script, then the terminal check, and only then chess
//! validation. Refusals come back as ordinary [`MoveOutcome`] values, and
//! side effects such as scripted replies are returned as an event list on
//! the successful outcome rather than delivered through callbacks.

use study_core::{Move, Piece, Square};
use study_engine::{GameStatus, Position, PositionError, PromotionPolicy};

use crate::annotation::{AnnotationId, AnnotationKind};
use crate::mode::BoardMode;
use crate::node::NodeId;
use crate::step::{AutoResponse, StepDescriptor};
use crate::tree::MoveTree;

/// What the evaluation layer sees after each applied move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReport {
    pub node: NodeId,
    /// FEN of the position the move produced.
    pub fen: String,
    pub uci: String,
    pub san: String,
    /// Status of the line at this node.
    pub status: GameStatus,
}

/// Side effects of a successful move, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The board played a scripted reply.
    AutoResponded(MoveReport),
    /// The script has been played to its end.
    ExerciseComplete,
    /// The board stopped accepting moves.
    BoardLocked,
}

/// The answer to a move request. Only the first variant changes the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The move was applied; `report` describes it for the evaluation
    /// layer and `events` lists what the script did afterwards.
    Played {
        report: MoveReport,
        events: Vec<SessionEvent>,
    },
    /// Refused by the lock, the mode, or the script. The move may well be
    /// chess-legal.
    ModeRestricted,
    /// Not a legal move in the current position.
    Illegal,
    /// The line is already finished.
    GameOver(GameStatus),
    /// The move promotes and the session requires the piece to be named.
    AmbiguousPromotion { from: Square, to: Square },
}

/// One interactive sitting at the board.
#[derive(Debug, Clone)]
pub struct Session {
    tree: MoveTree,
    mode: BoardMode,
    expected: Vec<String>,
    auto_respond: Option<AutoResponse>,
    progress: usize,
    locked: bool,
    policy: PromotionPolicy,
}

impl Session {
    /// Starts from the standard position with an empty script.
    pub fn new(mode: BoardMode) -> Session {
        Session::with_tree(MoveTree::new(), mode)
    }

    /// Wraps an existing tree, typically one loaded for replay or resumed
    /// study.
    pub fn with_tree(tree: MoveTree, mode: BoardMode) -> Session {
        Session {
            tree,
            mode,
            expected: Vec::new(),
            auto_respond: None,
            progress: 0,
            locked: false,
            policy: PromotionPolicy::QueenByDefault,
        }
    }

    /// Builds a session from a content step descriptor.
    ///
    /// Only the starting position is validated here; script entries that
    /// do not even parse as UCI are logged now and simply never match.
    pub fn from_step(step: &StepDescriptor) -> Result<Session, PositionError> {
        let position = Position::from_fen(&step.starting_position)?;
        for uci in &step.expected_moves {
            if Move::from_uci(uci).is_none() {
                tracing::warn!(uci = %uci, "step script entry is not a UCI move");
            }
        }
        let mut session = Session::with_tree(MoveTree::from_position(position), step.board_mode);
        session.expected = step.expected_moves.clone();
        session.auto_respond = step.auto_respond.clone();
        Ok(session)
    }

    /// Makes promotions require an explicit piece instead of defaulting to
    /// a queen.
    pub fn require_explicit_promotions(&mut self) {
        self.policy = PromotionPolicy::Explicit;
    }

    pub fn mode(&self) -> BoardMode {
        self.mode
    }

    pub fn tree(&self) -> &MoveTree {
        &self.tree
    }

    /// Hands the tree back, for serialization or rewrapping in another
    /// mode.
    pub fn into_tree(self) -> MoveTree {
        self.tree
    }

    pub fn position(&self) -> &Position {
        self.tree.position()
    }

    pub fn fen(&self) -> String {
        self.tree.position().to_fen()
    }

    pub fn status(&self) -> GameStatus {
        self.tree.status()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// How many script entries have been consumed so far.
    pub fn script_progress(&self) -> usize {
        self.progress
    }

    pub fn can_navigate(&self) -> bool {
        self.mode.can_navigate()
    }

    pub fn can_branch(&self) -> bool {
        self.mode.can_branch()
    }

    /// Plays a move through the mode's policy.
    ///
    /// Checks run in a fixed order: lock and mode capability, then the
    /// script, then whether the line is already over, then chess
    /// legality. An off-script move in a scripted mode is therefore
    /// answered with [`MoveOutcome::ModeRestricted`] even when it would be
    /// perfectly legal chess.
    pub fn try_move(&mut self, from: Square, to: Square, promotion: Option<Piece>) -> MoveOutcome {
        if self.locked || !self.mode.accepts_moves() {
            return MoveOutcome::ModeRestricted;
        }
        if self.mode.is_scripted() && !self.script_allows(from, to, promotion) {
            return MoveOutcome::ModeRestricted;
        }
        let status = self.tree.status();
        if status.is_over() {
            return MoveOutcome::GameOver(status);
        }
        let node = match self.tree.try_move_with(from, to, promotion, self.policy) {
            Err(err) => {
                return MoveOutcome::AmbiguousPromotion {
                    from: err.from,
                    to: err.to,
                }
            }
            Ok(None) => return MoveOutcome::Illegal,
            Ok(Some(node)) => node,
        };
        let mut events = Vec::new();
        if self.mode.is_scripted() {
            self.progress += 1;
            self.run_script_effects(&mut events);
        }
        MoveOutcome::Played {
            report: self.report(node),
            events,
        }
    }

    /// [`try_move`](Session::try_move) from a UCI string. Unparseable
    /// input counts as an illegal move.
    pub fn try_move_uci(&mut self, uci: &str) -> MoveOutcome {
        match Move::from_uci(uci) {
            Some(parsed) => self.try_move(parsed.from(), parsed.to(), parsed.kind().promotion()),
            None => MoveOutcome::Illegal,
        }
    }

    fn script_allows(&self, from: Square, to: Square, promotion: Option<Piece>) -> bool {
        match self.mode {
            // A lesson accepts any of the declared alternatives.
            BoardMode::Lesson => self
                .expected
                .iter()
                .any(|uci| entry_matches(uci, from, to, promotion, self.policy)),
            // A puzzle accepts exactly the next solution move.
            BoardMode::Puzzle => self
                .expected
                .get(self.progress)
                .map_or(false, |uci| entry_matches(uci, from, to, promotion, self.policy)),
            _ => true,
        }
    }

    fn run_script_effects(&mut self, events: &mut Vec<SessionEvent>) {
        match self.mode {
            BoardMode::Puzzle => {
                if self.progress < self.expected.len() {
                    let reply = self.expected[self.progress].clone();
                    if let Some(report) = self.play_scripted(&reply) {
                        self.progress += 1;
                        events.push(SessionEvent::AutoResponded(report));
                    }
                }
                if self.progress >= self.expected.len() {
                    events.push(SessionEvent::ExerciseComplete);
                    events.push(SessionEvent::BoardLocked);
                    self.locked = true;
                    tracing::debug!("puzzle solved, board locked");
                }
            }
            BoardMode::Lesson => {
                if let Some(auto) = self.auto_respond.take() {
                    if let Some(report) = self.play_scripted(&auto.uci) {
                        events.push(SessionEvent::AutoResponded(report));
                    }
                }
            }
            _ => {}
        }
    }

    /// Pushes a scripted move straight into the tree. A reply that is not
    /// legal in the position it is scripted for is a content bug; it is
    /// logged and skipped so the board never wedges on bad data.
    fn play_scripted(&mut self, uci: &str) -> Option<MoveReport> {
        match self.tree.try_move_uci(uci) {
            Some(node) => {
                tracing::debug!(uci = %uci, "played scripted reply");
                Some(self.report(node))
            }
            None => {
                tracing::warn!(uci = %uci, "scripted reply is not legal here, skipping");
                None
            }
        }
    }

    fn report(&self, node: NodeId) -> MoveReport {
        let n = self.tree.node(node).expect("a just-played node is live");
        MoveReport {
            node,
            fen: n.position().to_fen(),
            uci: n.played().map(|p| p.uci.clone()).unwrap_or_default(),
            san: n.played().map(|p| p.san.clone()).unwrap_or_default(),
            status: self.tree.status_at(node).unwrap_or(GameStatus::Active),
        }
    }

    /// Cursor navigation, honored only where the mode allows it. Returns
    /// false when the mode refuses or the tree is at the relevant edge.
    pub fn forward(&mut self) -> bool {
        self.mode.can_navigate() && self.tree.forward()
    }

    pub fn back(&mut self) -> bool {
        self.mode.can_navigate() && self.tree.back()
    }

    pub fn to_start(&mut self) -> bool {
        if self.mode.can_navigate() {
            self.tree.to_start();
            true
        } else {
            false
        }
    }

    pub fn to_end(&mut self) -> bool {
        if self.mode.can_navigate() {
            self.tree.to_end();
            true
        } else {
            false
        }
    }

    pub fn go_to(&mut self, id: NodeId) -> bool {
        self.mode.can_navigate() && self.tree.go_to(id)
    }

    /// Tree edits, honored only in modes that may branch.
    pub fn promote_variation(&mut self, id: NodeId) -> bool {
        self.mode.can_branch() && self.tree.promote_variation(id)
    }

    pub fn delete_variation(&mut self, id: NodeId) -> bool {
        self.mode.can_branch() && self.tree.delete_variation(id)
    }

    /// Decorates the current node.
    pub fn annotate(&mut self, kind: AnnotationKind) -> Option<AnnotationId> {
        if self.mode.can_branch() {
            self.tree.annotate(self.tree.cursor(), kind)
        } else {
            None
        }
    }

    /// Comments on the current node.
    pub fn set_comment(&mut self, comment: Option<String>) -> bool {
        self.mode.can_branch() && self.tree.set_comment(self.tree.cursor(), comment)
    }
}

/// Whether a script entry covers a (from, to, promotion) request. An
/// unnamed promotion resolves to a queen under the default policy; under
/// explicit naming it matches a scripted promotion on the squares alone,
/// leaving the missing piece for chess validation to report.
fn entry_matches(
    entry: &str,
    from: Square,
    to: Square,
    promotion: Option<Piece>,
    policy: PromotionPolicy,
) -> bool {
    let parsed = match Move::from_uci(entry) {
        Some(parsed) => parsed,
        None => return false,
    };
    if parsed.from() != from || parsed.to() != to {
        return false;
    }
    match (parsed.kind().promotion(), promotion) {
        (expected, requested) if expected == requested => true,
        (Some(Piece::Queen), None) if policy == PromotionPolicy::QueenByDefault => true,
        (Some(_), None) if policy == PromotionPolicy::Explicit => true,
        _ => false,
    }
}
