//! Undo/redo action history.
//!
//! [`ActionHistory`] owns the actions of an editing session. At most one
//! action records at a time: tools fetch it with
//! [`begin_action`](ActionHistory::begin_action) and the input layer seals
//! it with [`end_action`](ActionHistory::end_action). Finished actions land
//! on a bounded undo stack; undoing moves them to the redo stack, and
//! starting a new action discards the redo stack.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use super::action::{Action, UidRemap};
use super::world::EditableWorld;
use crate::config::HistoryConfig;
use crate::error::{ActionError, ActionResult};

/// Owner of the undo and redo stacks.
pub struct ActionHistory {
    undo_stack: VecDeque<Action>,
    redo_stack: Vec<Action>,
    current: Option<Action>,
    max_undo: usize,
    merge_window: Duration,
    merge_broken: bool,
    /// Tracks distance from the saved state.
    ///
    /// - `Some(0)`: the current state matches the last save.
    /// - `Some(n)`, `n > 0`: `n` undos needed to reach the saved state.
    /// - `Some(n)`, `n < 0`: `|n|` redos needed to reach the saved state.
    /// - `None`: never reachable again (dropped by capacity, discarded redo
    ///   branch, or merged into).
    save_distance: Option<i64>,
}

impl ActionHistory {
    /// Creates an empty history with the given maximum undo depth and
    /// merging disabled.
    pub fn new(max_undo: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            current: None,
            max_undo,
            merge_window: Duration::ZERO,
            merge_broken: false,
            save_distance: Some(0),
        }
    }

    pub fn with_config(config: &HistoryConfig) -> Self {
        let mut history = Self::new(config.max_undo);
        history.merge_window = config.merge_window();
        history
    }

    // ----- recording -----------------------------------------------------

    /// Returns the recording action, starting a new one if none is active.
    ///
    /// The redo stack is kept until the action ends with something recorded.
    pub fn begin_action(&mut self) -> &mut Action {
        self.current.get_or_insert_with(Action::new)
    }

    pub fn current_action(&mut self) -> Option<&mut Action> {
        self.current.as_mut()
    }

    pub fn is_recording(&self) -> bool {
        self.current.is_some()
    }

    /// Finishes the recording action and records it.
    ///
    /// Empty actions are dropped and leave both stacks untouched. Otherwise
    /// the redo stack is discarded and the action is merged into the top of
    /// the undo stack when [`Action::can_merge`] allows it, or pushed as a
    /// new step. Does nothing if no action is recording.
    pub fn end_action<W>(&mut self, world: &W) -> ActionResult
    where
        W: EditableWorld + ?Sized,
    {
        let Some(mut action) = self.current.take() else {
            return Ok(());
        };
        action.finish(world)?;

        if action.is_empty() {
            log::trace!("Dropping empty action");
            return Ok(());
        }

        if !self.redo_stack.is_empty() {
            log::debug!("Discarding {} redo steps", self.redo_stack.len());
            self.redo_stack.clear();
        }
        // A save point on the redo branch is gone for good.
        if let Some(d) = self.save_distance
            && d < 0
        {
            self.save_distance = None;
        }

        if !self.merge_broken
            && let Some(last) = self.undo_stack.back_mut()
        {
            match last.merge(action, self.merge_window) {
                None => {
                    log::debug!("Merged action into [{}]", last.label());
                    // The saved state was the top entry, which just changed.
                    if self.save_distance == Some(0) {
                        self.save_distance = None;
                    }
                    return Ok(());
                }
                Some(returned) => action = returned,
            }
        }
        self.merge_broken = false;

        if let Some(d) = &mut self.save_distance {
            *d += 1;
        }
        self.undo_stack.push_back(action);
        self.enforce_capacity();
        Ok(())
    }

    /// Prevents the next finished action from merging into the current top.
    pub fn break_merge_chain(&mut self) {
        self.merge_broken = true;
    }

    fn enforce_capacity(&mut self) {
        while self.undo_stack.len() > self.max_undo {
            self.undo_stack.pop_front();
            // If the save point was beyond the oldest surviving entry, it's gone.
            if let Some(d) = self.save_distance
                && d > self.undo_stack.len() as i64
            {
                self.save_distance = None;
            }
        }
    }

    // ----- undo / redo ---------------------------------------------------

    /// Undoes the most recent action.
    ///
    /// Fails while an action is recording or when there is nothing to undo.
    pub fn undo<W>(&mut self, world: &mut W) -> ActionResult
    where
        W: EditableWorld + ?Sized,
    {
        if self.current.is_some() {
            return Err(ActionError::ActionInProgress);
        }
        let mut action = self.undo_stack.pop_back().ok_or(ActionError::NothingToUndo)?;
        let remaps = match action.undo(world, false) {
            Ok(remaps) => remaps,
            Err(e) => {
                self.undo_stack.push_back(action);
                return Err(e);
            }
        };
        self.forward_remaps(&remaps);
        self.redo_stack.push(action);
        if let Some(d) = &mut self.save_distance {
            *d -= 1;
        }
        Ok(())
    }

    /// Redoes the most recently undone action.
    pub fn redo<W>(&mut self, world: &mut W) -> ActionResult
    where
        W: EditableWorld + ?Sized,
    {
        if self.current.is_some() {
            return Err(ActionError::ActionInProgress);
        }
        let mut action = self.redo_stack.pop().ok_or(ActionError::NothingToRedo)?;
        let remaps = match action.undo(world, true) {
            Ok(remaps) => remaps,
            Err(e) => {
                self.redo_stack.push(action);
                return Err(e);
            }
        };
        self.forward_remaps(&remaps);
        self.undo_stack.push_back(action);
        if let Some(d) = &mut self.save_distance {
            *d += 1;
        }
        self.enforce_capacity();
        Ok(())
    }

    /// Points every other stored action at the uids objects were recreated
    /// under. The applied action is off both stacks while this runs.
    fn forward_remaps(&mut self, remaps: &[UidRemap]) {
        for remap in remaps {
            for action in self.undo_stack.iter_mut().chain(self.redo_stack.iter_mut()) {
                action.remap_uid(remap.old, remap.new);
            }
        }
    }

    // ----- queries -------------------------------------------------------

    pub fn can_undo(&self) -> bool {
        self.current.is_none() && !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        self.current.is_none() && !self.redo_stack.is_empty()
    }

    /// Labels of undoable actions, most recent first.
    pub fn undo_descriptions(&self) -> impl Iterator<Item = String> + '_ {
        self.undo_stack.iter().rev().map(Action::label)
    }

    /// Labels of redoable actions, most recent first.
    pub fn redo_descriptions(&self) -> impl Iterator<Item = String> + '_ {
        self.redo_stack.iter().rev().map(Action::label)
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_undo(&self) -> usize {
        self.max_undo
    }

    pub fn merge_window(&self) -> Duration {
        self.merge_window
    }

    /// Records the current state as the saved state.
    pub fn mark_saved(&mut self) {
        self.save_distance = Some(0);
    }

    /// Returns `true` if the current state differs from the last saved state.
    pub fn has_unsaved_changes(&self) -> bool {
        self.save_distance != Some(0)
    }

    /// Drops every stored action. A recording action is kept.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.merge_broken = false;
        // Clearing doesn't touch the world: still saved if we were saved.
        if self.save_distance != Some(0) {
            self.save_distance = None;
        }
    }
}

impl Default for ActionHistory {
    fn default() -> Self {
        Self::with_config(&HistoryConfig::default())
    }
}

impl fmt::Debug for ActionHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionHistory")
            .field("undo_count", &self.undo_stack.len())
            .field("redo_count", &self.redo_stack.len())
            .field("recording", &self.current.is_some())
            .field("max_undo", &self.max_undo)
            .field("merge_broken", &self.merge_broken)
            .field("save_distance", &self.save_distance)
            .finish()
    }
}
