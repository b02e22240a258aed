//! Dense ordering of a session's orderable requests.
//!
//! [`QueueOrder`] stores request ids in position order, so the request at
//! index `i` has position `i + 1`. Every operation keeps the sequence a dense
//! permutation of `1..=N`.

use crate::error::CoreError;
use crate::types::DbId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueOrder {
    ids: Vec<DbId>,
}

impl QueueOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of orderable requests.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Append at the tail and return the assigned position (`N + 1`).
    pub fn append(&mut self, id: DbId) -> i32 {
        self.ids.push(id);
        self.ids.len() as i32
    }

    /// 1-based position of `id`, if it is in the sequence.
    pub fn position_of(&self, id: DbId) -> Option<i32> {
        self.ids
            .iter()
            .position(|&other| other == id)
            .map(|idx| idx as i32 + 1)
    }

    pub fn contains(&self, id: DbId) -> bool {
        self.ids.contains(&id)
    }

    /// Remove `id` and close the gap. Returns `false` if it was absent.
    pub fn remove(&mut self, id: DbId) -> bool {
        match self.ids.iter().position(|&other| other == id) {
            Some(idx) => {
                self.ids.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Move `id` to `new_position`, clamped to `[1, N]`.
    ///
    /// Items strictly between the old and new slot shift by one (a list move,
    /// not a swap). Returns the position actually assigned.
    pub fn reposition(&mut self, id: DbId, new_position: i64) -> Result<i32, CoreError> {
        if self.ids.is_empty() {
            return Err(CoreError::OutOfRange(
                "session has no orderable requests".into(),
            ));
        }
        let from = self
            .ids
            .iter()
            .position(|&other| other == id)
            .ok_or_else(|| {
                CoreError::OutOfRange(format!("request {id} is not in the active queue"))
            })?;

        let target = clamp_position(new_position, self.ids.len()) - 1;
        let moved = self.ids.remove(from);
        self.ids.insert(target, moved);
        Ok(target as i32 + 1)
    }

    /// Ids paired with their 1-based positions.
    pub fn positions(&self) -> impl Iterator<Item = (DbId, i32)> + '_ {
        self.ids
            .iter()
            .enumerate()
            .map(|(idx, &id)| (id, idx as i32 + 1))
    }

    pub fn ids(&self) -> &[DbId] {
        &self.ids
    }
}

/// Clamp a requested 1-based position into `[1, len]`. `len` must be non-zero.
pub fn clamp_position(requested: i64, len: usize) -> usize {
    requested.clamp(1, len as i64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn order_of(ids: &[DbId]) -> QueueOrder {
        let mut order = QueueOrder::new();
        for &id in ids {
            order.append(id);
        }
        order
    }

    #[test]
    fn append_assigns_next_position() {
        let mut order = QueueOrder::new();
        assert_eq!(order.append(10), 1);
        assert_eq!(order.append(11), 2);
        assert_eq!(order.position_of(11), Some(2));
    }

    #[test]
    fn move_up_shifts_intermediate_items_down() {
        let mut order = order_of(&[1, 2, 3, 4, 5]);
        assert_eq!(order.reposition(5, 2), Ok(2));
        assert_eq!(order.ids(), &[1, 5, 2, 3, 4]);
    }

    #[test]
    fn move_down_shifts_intermediate_items_up() {
        let mut order = order_of(&[1, 2, 3, 4, 5]);
        assert_eq!(order.reposition(1, 4), Ok(4));
        assert_eq!(order.ids(), &[2, 3, 4, 1, 5]);
    }

    #[test]
    fn reposition_clamps_both_ends() {
        let mut order = order_of(&[1, 2, 3]);
        assert_eq!(order.reposition(2, 99), Ok(3));
        assert_eq!(order.ids(), &[1, 3, 2]);
        assert_eq!(order.reposition(2, -4), Ok(1));
        assert_eq!(order.ids(), &[2, 1, 3]);
    }

    #[test]
    fn reposition_is_idempotent() {
        let mut order = order_of(&[1, 2, 3, 4]);
        order.reposition(4, 1).unwrap();
        let once = order.clone();
        order.reposition(4, 1).unwrap();
        assert_eq!(order, once);
    }

    #[test]
    fn reposition_on_empty_sequence_is_out_of_range() {
        let mut order = QueueOrder::new();
        assert_matches!(order.reposition(1, 1), Err(CoreError::OutOfRange(_)));
    }

    #[test]
    fn reposition_unknown_id_is_out_of_range() {
        let mut order = order_of(&[1, 2]);
        assert_matches!(order.reposition(9, 1), Err(CoreError::OutOfRange(_)));
        assert_eq!(order.ids(), &[1, 2]);
    }

    #[test]
    fn remove_compacts_positions() {
        let mut order = order_of(&[1, 2, 3, 4]);
        assert!(order.remove(2));
        assert!(!order.remove(2));
        let positions: Vec<_> = order.positions().collect();
        assert_eq!(positions, vec![(1, 1), (3, 2), (4, 3)]);
    }
}
