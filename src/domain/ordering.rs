//! Dense display ordering over the photo set.
//!
//! A reorder is a permutation of every photo id; position `i` becomes
//! `display_order = i`. Rows are rewritten by the repository inside a single
//! transaction, these helpers only decide what to write.

use std::collections::HashSet;

use derive_more::Display;
use uuid::Uuid;

#[derive(Debug, Display, PartialEq)]
pub enum ReorderError {
    #[display("Photo id {_0} appears more than once")]
    Duplicate(Uuid),

    #[display("Photo id {_0} does not exist")]
    Unknown(Uuid),

    #[display("Reorder must include every photo; {_0} missing")]
    Missing(usize),

    #[display("Target index {index} is out of range for {len} photos")]
    IndexOutOfRange { index: usize, len: usize },

    #[display("Photo {_0} not found")]
    PhotoNotFound(Uuid),
}

/// Checks that `requested` is a permutation of `current`.
pub fn validate_reorder(current: &[Uuid], requested: &[Uuid]) -> Result<(), ReorderError> {
    let known: HashSet<&Uuid> = current.iter().collect();
    let mut seen = HashSet::with_capacity(requested.len());

    for id in requested {
        if !seen.insert(id) {
            return Err(ReorderError::Duplicate(*id));
        }
        if !known.contains(id) {
            return Err(ReorderError::Unknown(*id));
        }
    }

    let missing = current.len() - seen.len();
    if missing > 0 {
        return Err(ReorderError::Missing(missing));
    }

    Ok(())
}

/// Pairs every id with its 0-based position.
pub fn assign_positions(ids: &[Uuid]) -> (Vec<Uuid>, Vec<i32>) {
    let positions = (0..ids.len() as i32).collect();
    (ids.to_vec(), positions)
}

/// Removes the element at `from` and reinserts it at `to`, shifting the
/// elements in between by one.
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), ReorderError> {
    let len = items.len();
    if from >= len {
        return Err(ReorderError::IndexOutOfRange { index: from, len });
    }
    if to >= len {
        return Err(ReorderError::IndexOutOfRange { index: to, len });
    }
    let item = items.remove(from);
    items.insert(to, item);
    Ok(())
}

/// Full sequence produced by moving `id` to `to_index` within `current`.
pub fn plan_move(current: &[Uuid], id: Uuid, to_index: usize) -> Result<Vec<Uuid>, ReorderError> {
    let from = current
        .iter()
        .position(|candidate| *candidate == id)
        .ok_or(ReorderError::PhotoNotFound(id))?;

    let mut order = current.to_vec();
    array_move(&mut order, from, to_index)?;
    Ok(order)
}
