//! Perft: counting leaf nodes of the legal move tree to validate the
//! generator against published totals.
//!
//! Pseudo-legal moves that [`Position::apply_move`] rejects are skipped, so
//! the counts are of legal moves.

use super::generate_moves;
use crate::{Position, SearchBudget, SearchCancelled};

/// Number of leaf nodes `depth` plies below `position`.
pub fn perft(position: &mut Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = generate_moves(position, position.side_to_move());
    let mut nodes = 0;
    for &mv in &moves {
        if position.apply_move(mv).is_err() {
            continue;
        }
        nodes += if depth == 1 { 1 } else { perft(position, depth - 1) };
        position.undo_move();
    }
    nodes
}

/// Per-move subtotals at the root, sorted by coordinate notation.
pub fn perft_divide(position: &mut Position, depth: u32) -> Vec<(String, u64)> {
    let moves = generate_moves(position, position.side_to_move());
    let mut results = Vec::with_capacity(moves.len());
    for &mv in &moves {
        if position.apply_move(mv).is_err() {
            continue;
        }
        let nodes = perft(position, depth.saturating_sub(1));
        position.undo_move();
        results.push((mv.to_uci(), nodes));
    }
    results.sort_by(|a, b| a.0.cmp(&b.0));
    results
}

/// [`perft`] that polls `budget` at every visited node.
///
/// On cancellation every applied move has been taken back, so `position`
/// is exactly as it was passed in.
pub fn perft_with_budget(position: &mut Position, depth: u32, budget: &SearchBudget) -> Result<u64, SearchCancelled> {
    let result = budgeted(position, depth, budget);
    if let Err(cancelled) = &result {
        tracing::debug!(depth, nodes = budget.nodes(), %cancelled, "perft cancelled");
    }
    result
}

fn budgeted(position: &mut Position, depth: u32, budget: &SearchBudget) -> Result<u64, SearchCancelled> {
    budget.check()?;
    if depth == 0 {
        return Ok(1);
    }
    let moves = generate_moves(position, position.side_to_move());
    let mut nodes = 0;
    for &mv in &moves {
        if position.apply_move(mv).is_err() {
            continue;
        }
        let below = budgeted(position, depth - 1, budget);
        position.undo_move();
        nodes += below?;
    }
    Ok(nodes)
}
