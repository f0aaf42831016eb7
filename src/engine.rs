//! Pure turn and win logic, no I/O.
//!
//! Everything here operates on plain values so the synchronizer (and a
//! stricter transactional store variant, should one ever exist) can reuse it
//! unchanged.

use crate::types::*;
use rand::seq::SliceRandom;
use rand::Rng;

/// Judge a submitted answer against the expected one.
///
/// Case-insensitive, whitespace-trimmed exact match. No fuzzy matching,
/// no partial credit.
pub fn evaluate_answer(submitted: &str, expected: &str) -> bool {
    submitted.trim().to_lowercase() == expected.trim().to_lowercase()
}

/// Apply an answer outcome to the board, returning a new board.
///
/// An incorrect answer knocks out the hit cup; a correct one leaves the
/// board untouched. The input is never mutated.
pub fn apply_outcome(cups: &[bool], hit: usize, correct: bool) -> CupBoard {
    let mut next = cups.to_vec();
    if !correct {
        if let Some(cell) = next.get_mut(hit) {
            *cell = false;
        }
    }
    next
}

/// Check whether this answer eliminates a team's entire half.
///
/// A cell counts as inactive if it was already `false` before the answer,
/// or if it is the cell just hit and the answer was incorrect. Returns the
/// *winning* team. Only one cell changes per turn, so both halves reporting
/// eliminated is structurally one-sided; if it happens anyway, the half
/// containing `hit` is the one just completed and its opponents win.
pub fn detect_win(cups: &[bool], hit: usize, correct: bool) -> Option<Team> {
    let half_out = |team: Team| {
        team.cells()
            .all(|i| !cups.get(i).copied().unwrap_or(false) || (i == hit && !correct))
    };
    match (half_out(Team::One), half_out(Team::Two)) {
        (true, true) => Some(Team::of_cell(hit).opponent()),
        (true, false) => Some(Team::Two),
        (false, true) => Some(Team::One),
        (false, false) => None,
    }
}

/// Rotate the turn pointer through the roster.
///
/// Callers only advance on a non-winning outcome.
pub fn next_turn_index(current: usize, roster_len: usize) -> usize {
    if roster_len == 0 {
        0
    } else {
        (current + 1) % roster_len
    }
}

/// Draw a uniform-random question from the (already filtered) pool.
///
/// `None` on an empty pool; the caller treats the cup hit as a no-op then.
pub fn draw_question<'a>(pool: &[&'a Question]) -> Option<&'a Question> {
    if pool.is_empty() {
        return None;
    }
    let mut rng = rand::rng();
    Some(pool[rng.random_range(0..pool.len())])
}

/// Shuffle the roster and split the first four players into two pairs.
///
/// `None` with fewer than four players; both teams are always full.
pub fn generate_teams(roster: &[PlayerName]) -> Option<Teams> {
    if roster.len() < 2 * TEAM_SIZE {
        return None;
    }
    let mut shuffled = roster.to_vec();
    shuffled.shuffle(&mut rand::rng());
    shuffled.truncate(2 * TEAM_SIZE);
    let second = shuffled.split_off(TEAM_SIZE);
    Some(Teams {
        first: shuffled,
        second,
    })
}
