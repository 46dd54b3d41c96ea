//! Navigation cursor over an ordered result set.
//!
//! Tracks which document of the current search results is in view,
//! independent of which concrete page is loaded. Movement clamps at both
//! ends rather than wrapping, and list changes are reconciled by document
//! id so upstream insertions and removals do not silently shift the
//! displayed position.

use crate::models::Direction;

#[derive(Debug, Clone, Default)]
pub struct NavigationCursor {
    ordered_ids: Vec<String>,
    current_index: Option<usize>,
}

impl NavigationCursor {
    /// Cursor over `ordered_ids` positioned at `start_index`, clamped to
    /// the list. An empty list yields a cursor with no position.
    pub fn new(ordered_ids: Vec<String>, start_index: usize) -> Self {
        let current_index = if ordered_ids.is_empty() {
            None
        } else {
            Some(start_index.min(ordered_ids.len() - 1))
        };
        Self {
            ordered_ids,
            current_index,
        }
    }

    pub fn ordered_ids(&self) -> &[String] {
        &self.ordered_ids
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_index
            .map(|i| self.ordered_ids[i].as_str())
    }

    pub fn len(&self) -> usize {
        self.ordered_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_ids.is_empty()
    }

    /// Move one step through the result order. At either boundary (or on
    /// an empty list) this is a no-op. Returns the id now under the
    /// cursor, if any.
    pub fn advance(&mut self, direction: Direction) -> Option<&str> {
        if let Some(index) = self.current_index {
            match direction {
                Direction::Next => {
                    if index + 1 < self.ordered_ids.len() {
                        self.current_index = Some(index + 1);
                    }
                }
                Direction::Previous => {
                    if index > 0 {
                        self.current_index = Some(index - 1);
                    }
                }
            }
        }
        self.current_id()
    }

    /// Position the cursor on `id`. If `id` is not in the result order the
    /// cursor is left unchanged. Returns whether the jump landed.
    pub fn jump_to(&mut self, id: &str) -> bool {
        match self.ordered_ids.iter().position(|candidate| candidate == id) {
            Some(index) => {
                self.current_index = Some(index);
                true
            }
            None => false,
        }
    }

    /// Replace the result order with `ordered_ids`, re-locating the
    /// current document by id. If the current id is gone (or there was no
    /// position), the cursor lands on the first entry of the new list.
    pub fn reconcile(&mut self, ordered_ids: Vec<String>) {
        let current_id = self.current_id().map(str::to_string);
        self.ordered_ids = ordered_ids;

        self.current_index = if self.ordered_ids.is_empty() {
            None
        } else {
            current_id
                .and_then(|id| self.ordered_ids.iter().position(|c| *c == id))
                .or(Some(0))
        };
    }
}
