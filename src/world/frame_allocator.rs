use crate::collision::PairKey;

/// Scratch storage reused by every step so the hot loop does not allocate once the
/// buffers have grown to the scene size. Nothing in here survives a step.
#[derive(Debug, Default)]
pub struct FrameAllocator {
    /// Pairs whose manifold is active this step, in solver order.
    pub(crate) active_pairs: Vec<PairKey>,
    /// Solver ordering keys, parallel to `active_pairs`.
    pub(crate) order_keys: Vec<(bool, usize)>,
    /// Scratch copy used when reordering `active_pairs`.
    pub(crate) sorted_pairs: Vec<PairKey>,
}

impl FrameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties every buffer, keeping their capacity.
    pub fn reset(&mut self) {
        self.active_pairs.clear();
        self.order_keys.clear();
        self.sorted_pairs.clear();
    }

    pub fn active_pairs(&self) -> &[PairKey] {
        &self.active_pairs
    }
}
