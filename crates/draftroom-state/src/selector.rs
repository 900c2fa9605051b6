//! The `PickSelector` trait: how the engine picks on a participant's behalf.
//!
//! When a pick timer expires, the room asks its selector to choose one item
//! from the remaining pool. The default is a uniform random choice; tests
//! and deterministic demos use [`FirstAvailable`].

use draftroom_protocol::PlayerId;
use rand::Rng;

/// Chooses an item for an auto-draft.
///
/// Called with the room lock held, so implementations must be quick and
/// must not block.
pub trait PickSelector: Send + Sync + 'static {
    /// Returns the index into `available` of the chosen item, or `None`
    /// when `available` is empty.
    ///
    /// If the pool is non-empty and this returns `None` or an out-of-range
    /// index, the room takes the first remaining item instead.
    fn choose(&self, available: &[PlayerId]) -> Option<usize>;
}

/// Picks uniformly at random from the remaining pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSelector;

impl PickSelector for RandomSelector {
    fn choose(&self, available: &[PlayerId]) -> Option<usize> {
        if available.is_empty() {
            return None;
        }
        Some(rand::rng().random_range(0..available.len()))
    }
}

/// Always picks the first remaining item in pool order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstAvailable;

impl PickSelector for FirstAvailable {
    fn choose(&self, available: &[PlayerId]) -> Option<usize> {
        if available.is_empty() { None } else { Some(0) }
    }
}
