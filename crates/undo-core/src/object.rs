#![forbid(unsafe_code)]

//! The reversible-mutation capability supplied by editor features.
//!
//! An [`UndoObject`] captures enough state to reverse one mutation and to
//! replay it afterwards. Domain code builds one whenever it changes
//! something and hands it to [`UndoManager::record_undo`]; from then on the
//! object is exclusively owned by the step that recorded it and is dropped
//! together with that step.
//!
//! # Invariants
//!
//! - `undo(_)` followed by `redo()` restores the state that existed right
//!   after the mutation.
//! - While `undo(false)` runs (silent restore of a cancelled recording), the
//!   object must not produce anything that reaches `record_undo`. The manager
//!   suspends recording around restores anyway, so a stray record is
//!   discarded rather than filed.
//!
//! # Failure Modes
//!
//! - **Stale target**: the object refers to something that was deleted.
//!   Report it with [`UndoError::TargetNotFound`]; the manager propagates it
//!   to the caller of `undo`/`redo` unchanged.
//!
//! [`UndoManager::record_undo`]: crate::UndoManager::record_undo

use std::fmt;

use crate::error::{UndoError, UndoResult};

/// A single reversible mutation.
pub trait UndoObject {
    /// Reverse the mutation.
    ///
    /// `user_initiated` is true when the user asked for an undo, and false
    /// when the manager silently rolls back an in-progress recording
    /// (`cancel`, `restore`, `super_cancel`).
    fn undo(&mut self, user_initiated: bool) -> UndoResult;

    /// Reapply the mutation after it was undone.
    fn redo(&mut self) -> UndoResult;

    /// Human-readable description of the mutation (e.g. "Move").
    fn description(&self) -> &str;

    /// Name of the object the mutation touched, used for display
    /// aggregation. Empty when the mutation has no single target.
    fn object_name(&self) -> &str {
        ""
    }

    /// Approximate size of this object in bytes, for memory reporting.
    fn size_bytes(&self) -> usize {
        std::mem::size_of_val(self)
    }
}

impl fmt::Debug for dyn UndoObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoObject")
            .field("description", &self.description())
            .field("object_name", &self.object_name())
            .field("size_bytes", &self.size_bytes())
            .finish()
    }
}

/// Callback type for reversing a mutation.
pub type UndoFn = Box<dyn FnMut(bool) -> UndoResult>;
/// Callback type for replaying a mutation.
pub type RedoFn = Box<dyn FnMut() -> UndoResult>;

/// An [`UndoObject`] assembled from closures.
///
/// Convenient for features whose mutation is a simple "set value" on some
/// shared state: capture the old and new values in the closures.
///
/// ```ignore
/// let doc = Rc::new(Cell::new(0));
/// let (d1, d2) = (doc.clone(), doc.clone());
/// let obj = CallbackObject::new("Set X")
///     .with_undo(move |_| { d1.set(0); Ok(()) })
///     .with_redo(move || { d2.set(5); Ok(()) });
/// manager.record_undo(Box::new(obj));
/// ```
pub struct CallbackObject {
    description: String,
    object_name: String,
    undo: Option<UndoFn>,
    redo: Option<RedoFn>,
}

impl fmt::Debug for CallbackObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackObject")
            .field("description", &self.description)
            .field("object_name", &self.object_name)
            .field("has_undo", &self.undo.is_some())
            .field("has_redo", &self.redo.is_some())
            .finish()
    }
}

impl CallbackObject {
    /// Create an object with the given description and no callbacks.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            object_name: String::new(),
            undo: None,
            redo: None,
        }
    }

    /// Set the name of the object this mutation touched.
    #[must_use]
    pub fn with_object_name(mut self, name: impl Into<String>) -> Self {
        self.object_name = name.into();
        self
    }

    /// Set the undo callback.
    #[must_use]
    pub fn with_undo<F>(mut self, f: F) -> Self
    where
        F: FnMut(bool) -> UndoResult + 'static,
    {
        self.undo = Some(Box::new(f));
        self
    }

    /// Set the redo callback.
    #[must_use]
    pub fn with_redo<F>(mut self, f: F) -> Self
    where
        F: FnMut() -> UndoResult + 'static,
    {
        self.redo = Some(Box::new(f));
        self
    }
}

impl UndoObject for CallbackObject {
    fn undo(&mut self, user_initiated: bool) -> UndoResult {
        match self.undo.as_mut() {
            Some(undo) => undo(user_initiated),
            None => Err(UndoError::undo_failed(
                &self.description,
                "no undo callback set",
            )),
        }
    }

    fn redo(&mut self) -> UndoResult {
        match self.redo.as_mut() {
            Some(redo) => redo(),
            None => Err(UndoError::redo_failed(
                &self.description,
                "no redo callback set",
            )),
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn object_name(&self) -> &str {
        &self.object_name
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.description.len() + self.object_name.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
