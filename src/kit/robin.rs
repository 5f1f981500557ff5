//! Robin Manager (spec section 4.9): round-robin selection across the
//! alternate takes in one velocity layer. Grounded on
//! `original_source/DrumFont/RobinMgr.cpp`'s `ChooseRobin`, but the
//! cursor here post-increments: the first `choose()` after construction
//! returns index 0, per spec.md section 8's testable round-robin
//! sequence (`r1, r2, r3, r1, ...`), which governs over the original's
//! pre-increment behavior. Only strict round-robin is implemented;
//! weighted or least-recently-used selection is future work noted in
//! the original, not this crate.

#[derive(Debug, Clone)]
pub struct RobinManager {
    cursor: usize,
    len: usize,
}

impl RobinManager {
    pub fn new(len: usize) -> Self {
        RobinManager { cursor: 0, len }
    }

    /// Return the current cursor and advance it modulo `len`. Panics if
    /// the layer has no robins — the validator guarantees at least one
    /// before a `RobinManager` is ever built.
    pub fn choose(&mut self) -> usize {
        assert!(self.len > 0, "robin manager has no robins to choose from");
        let chosen = self.cursor;
        self.cursor = (self.cursor + 1) % self.len;
        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotates_through_all_indices_before_repeating() {
        let mut mgr = RobinManager::new(3);
        let picks: Vec<usize> = (0..6).map(|_| mgr.choose()).collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn single_robin_always_returns_index_zero() {
        let mut mgr = RobinManager::new(1);
        assert_eq!(mgr.choose(), 0);
        assert_eq!(mgr.choose(), 0);
    }
}
