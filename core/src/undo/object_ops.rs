//! Per-object operation logs and their net effect.
//!
//! Within one action an object can be added, transformed and removed any
//! number of times. Undo and redo only care about the difference between
//! the state before the first operation and the state after the last one,
//! which [`resolve`] computes by folding the log.

use super::world::ObjectUid;

/// One lifecycle operation recorded against an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectOp {
    Added,
    Removed,
    Transformed,
}

/// What an action did to an object, seen from outside the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetEffect {
    /// Nothing observable: no operations, added-then-removed, or a log
    /// that could not be interpreted.
    Unchanged,
    /// Did not exist before, exists after.
    Created,
    /// Existed before, does not exist after.
    Destroyed,
    /// Existed before and after, possibly with a different placement.
    Moved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Absent,
    Present,
}

impl Presence {
    fn step(self, op: ObjectOp) -> Option<Self> {
        match (self, op) {
            (Self::Absent, ObjectOp::Added) => Some(Self::Present),
            (Self::Present, ObjectOp::Removed) => Some(Self::Absent),
            (Self::Present, ObjectOp::Transformed) => Some(Self::Present),
            _ => None,
        }
    }
}

/// Folds an operation log into its net effect.
///
/// Returns `None` when the log is inconsistent (an add on a live object, a
/// remove or transform on a missing one).
pub fn try_resolve(ops: &[ObjectOp]) -> Option<NetEffect> {
    let first = *ops.first()?;
    let before = if first == ObjectOp::Added {
        Presence::Absent
    } else {
        Presence::Present
    };
    let after = ops.iter().try_fold(before, |state, &op| state.step(op))?;
    let effect = match (before, after) {
        (Presence::Absent, Presence::Absent) => NetEffect::Unchanged,
        (Presence::Absent, Presence::Present) => NetEffect::Created,
        (Presence::Present, Presence::Absent) => NetEffect::Destroyed,
        (Presence::Present, Presence::Present) => NetEffect::Moved,
    };
    Some(effect)
}

/// Like [`try_resolve`], but maps inconsistent logs to
/// [`NetEffect::Unchanged`] so they never trigger a create or destroy.
pub fn resolve(ops: &[ObjectOp]) -> NetEffect {
    try_resolve(ops).unwrap_or(NetEffect::Unchanged)
}

/// Operation history of one object inside one action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectOpLog {
    ops: Vec<ObjectOp>,
}

impl ObjectOpLog {
    pub fn push(&mut self, op: ObjectOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[ObjectOp] {
        &self.ops
    }

    pub fn first(&self) -> Option<ObjectOp> {
        self.ops.first().copied()
    }

    pub fn append(&mut self, later: ObjectOpLog) {
        self.ops.extend(later.ops);
    }

    /// Net effect, logging inconsistent logs for `uid`.
    pub fn net_effect(&self, uid: ObjectUid) -> NetEffect {
        match try_resolve(&self.ops) {
            Some(effect) => effect,
            None => {
                log::warn!(
                    "Inconsistent operation log for object {uid}: {:?}; leaving it untouched",
                    self.ops
                );
                NetEffect::Unchanged
            }
        }
    }
}
