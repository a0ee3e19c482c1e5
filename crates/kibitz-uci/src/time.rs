//! Time management: turn `go` clock parameters into search limits.

use std::time::Duration;

use kibitz_core::SearchLimits;

use crate::command::GoParams;

/// Moves assumed left in the game when the GUI does not say.
const DEFAULT_MOVES_TO_GO: u32 = 30;

/// Compute a per-move budget from remaining time and increment.
///
/// | Parameter           | No increment | With increment      |
/// |---------------------|--------------|---------------------|
/// | Base                | usable / mtg | usable / mtg        |
/// | Increment contrib   | n/a          | `base + inc * 0.75` |
/// | Hard cap (% usable) | 12%          | 25%                 |
///
/// `overhead` is taken off the clock first. The result is never below 1 ms.
pub fn move_budget(
    remaining: Duration,
    increment: Duration,
    moves_to_go: Option<u32>,
    overhead: Duration,
) -> Duration {
    let usable = remaining.saturating_sub(overhead).as_millis() as f64;
    if usable < 1.0 {
        return Duration::from_millis(1);
    }

    let inc_ms = increment.as_millis() as f64;
    let has_increment = inc_ms > 0.0;
    let mtg = moves_to_go.unwrap_or(DEFAULT_MOVES_TO_GO).max(1) as f64;

    let base = usable / mtg;
    let budget = if has_increment {
        base + inc_ms * 0.75
    } else {
        base
    };
    let cap = usable * if has_increment { 0.25 } else { 0.12 };

    Duration::from_millis(budget.min(cap).max(1.0) as u64)
}

/// Merge `go` parameters into the session's configured limits.
///
/// An explicit `movetime` wins over the clock; both lose `overhead`.
/// `ponder` searches until stopped, like `infinite`.
pub fn limits_from_go(
    params: &GoParams,
    base: &SearchLimits,
    white_to_move: bool,
    overhead: Duration,
) -> SearchLimits {
    let (remaining, increment) = if white_to_move {
        (params.wtime, params.winc)
    } else {
        (params.btime, params.binc)
    };

    let movetime = match (params.movetime, remaining) {
        (Some(fixed), _) => Some(fixed.saturating_sub(overhead).max(Duration::from_millis(1))),
        (None, Some(clock)) => Some(move_budget(
            clock,
            increment.unwrap_or_default(),
            params.movestogo,
            overhead,
        )),
        (None, None) => None,
    };

    SearchLimits {
        depth: params.depth,
        movetime,
        nodes: params.nodes,
        infinite: params.infinite || params.ponder,
        ..base.clone()
    }
}
