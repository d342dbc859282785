//! PGN-compatible move text export.

use study_core::Color;
use study_engine::GameStatus;

use crate::node::NodeId;
use crate::tree::MoveTree;

/// Main-line move text with move numbers and a result marker, for example
/// `1. e4 e5 2. Nf3 *`.
pub fn move_text(tree: &MoveTree) -> String {
    let mut out = String::new();
    let line = tree.main_line();
    let mut force_number = true;
    for &id in line.iter().skip(1) {
        emit_move(tree, id, &mut out, force_number);
        force_number = false;
    }
    let leaf = line.last().copied().unwrap_or(tree.root());
    push_token(&mut out, result_marker(tree, leaf));
    out
}

/// Move text of the whole tree. Each variation follows the move it
/// diverges from, parenthesized and renumbered from its first move, so
/// branching lines stay unambiguous.
pub fn move_text_with_variations(tree: &MoveTree) -> String {
    let mut out = String::new();
    render_line(tree, tree.root(), &mut out, true);
    let line = tree.main_line();
    let leaf = line.last().copied().unwrap_or(tree.root());
    push_token(&mut out, result_marker(tree, leaf));
    out
}

fn render_line(tree: &MoveTree, from: NodeId, out: &mut String, mut force_number: bool) {
    let mut current = from;
    loop {
        let children = match tree.node(current) {
            Some(node) => node.children(),
            None => return,
        };
        let main = match children.first() {
            Some(&main) => main,
            None => return,
        };
        emit_move(tree, main, out, force_number);
        for &variation in &children[1..] {
            out.push_str(" (");
            emit_move(tree, variation, out, true);
            render_line(tree, variation, out, false);
            out.push(')');
        }
        // Black's reply is renumbered after a parenthesized interruption.
        force_number = children.len() > 1;
        current = main;
    }
}

fn emit_move(tree: &MoveTree, id: NodeId, out: &mut String, force_number: bool) {
    let node = match tree.node(id) {
        Some(node) => node,
        None => return,
    };
    let (parent, played) = match (node.parent().and_then(|p| tree.node(p)), node.played()) {
        (Some(parent), Some(played)) => (parent, played),
        _ => return,
    };
    let number = parent.position().fullmove_number;
    let token = match parent.position().side_to_move {
        Color::White => format!("{number}. {}", played.san),
        Color::Black if force_number => format!("{number}... {}", played.san),
        Color::Black => played.san.clone(),
    };
    push_token(out, &token);
}

fn push_token(out: &mut String, token: &str) {
    if !out.is_empty() && !out.ends_with('(') {
        out.push(' ');
    }
    out.push_str(token);
}

fn result_marker(tree: &MoveTree, leaf: NodeId) -> &'static str {
    match tree.status_at(leaf) {
        Some(GameStatus::Checkmate {
            winner: Color::White,
        }) => "1-0",
        Some(GameStatus::Checkmate {
            winner: Color::Black,
        }) => "0-1",
        Some(GameStatus::Stalemate) | Some(GameStatus::Draw(_)) => "1/2-1/2",
        _ => "*",
    }
}
