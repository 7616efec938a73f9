/// Connection matcher: judges candidate edges against a round's target graph.
///
/// Pure functions over `(round, user_edges)`; scoring and the round
/// transition live in the session.

use crate::domain::sky::{Edge, Round, StarId};

/// Result of submitting one candidate edge.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EdgeOutcome {
    pub accepted: bool,
    pub correct: bool,
}

impl EdgeOutcome {
    pub const REJECTED: EdgeOutcome = EdgeOutcome { accepted: false, correct: false };
}

/// Submit `from → to`.
///
/// Rejected (no change) for self-loops, unknown stars, or an edge already
/// present in either orientation. Otherwise appended, and tagged correct
/// iff it belongs to the target graph. Wrong edges stay in `user_edges`.
pub fn try_add_edge(round: &Round, user_edges: &mut Vec<Edge>, from: StarId, to: StarId) -> EdgeOutcome {
    if !round.has_star(from) || !round.has_star(to) {
        return EdgeOutcome::REJECTED;
    }
    let edge = match Edge::new(from, to) {
        Some(e) => e,
        None => return EdgeOutcome::REJECTED,
    };
    if user_edges.contains(&edge) {
        return EdgeOutcome::REJECTED;
    }
    user_edges.push(edge);
    EdgeOutcome { accepted: true, correct: round.is_target(&edge) }
}

/// Distinct target edges the user has matched.
pub fn matched_count(round: &Round, user_edges: &[Edge]) -> usize {
    round.target().iter().filter(|t| user_edges.contains(t)).count()
}

/// Every target edge matched at least once. Wrong edges never block this.
pub fn is_complete(round: &Round, user_edges: &[Edge]) -> bool {
    matched_count(round, user_edges) >= round.target().len()
}
