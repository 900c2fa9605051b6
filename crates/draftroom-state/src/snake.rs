//! Snake-order arithmetic.
//!
//! With `N` participants in a fixed pick order, odd rounds run front to
//! back and even rounds run back to front:
//!
//! ```text
//! round 1: 0 1 2 … N-1
//! round 2: N-1 … 2 1 0
//! round 3: 0 1 2 … N-1
//! ```
//!
//! ```
//! use draftroom_state::snake;
//!
//! let order: Vec<usize> = snake::sequence(3, 2).collect();
//! assert_eq!(order, [0, 1, 2, 2, 1, 0]);
//! ```

/// Position in the pick order that owns the pick at `pick_index` (0-based)
/// during `round` (1-based).
///
/// `participants` must be non-zero.
pub fn position(pick_index: u32, participants: u32, round: u32) -> usize {
    let offset = pick_index % participants;
    let pos = if round % 2 == 1 {
        offset
    } else {
        participants - 1 - offset
    };
    pos as usize
}

/// The 1-based round that the pick at `pick_index` (0-based) falls in.
pub fn round_of(pick_index: u32, participants: u32) -> u32 {
    pick_index / participants + 1
}

/// Every pick-order position for a full draft, in pick order.
pub fn sequence(participants: u32, rounds: u32) -> impl Iterator<Item = usize> {
    let total = participants.saturating_mul(rounds);
    (0..total).map(move |idx| position(idx, participants, round_of(idx, participants)))
}
