#![forbid(unsafe_code)]

//! Scope guards for recording sessions and suspension.
//!
//! Guards close what they opened when they go out of scope, including on
//! early return and unwinding:
//!
//! ```ignore
//! fn move_selection(manager: &UndoManager, delta: Vec3) {
//!     let _scope = manager.scope("Move");   // begin() unless already open
//!     for entity in selection() {
//!         entity.translate(delta);          // hooks call record_undo
//!     }
//! }                                         // accept("Move") here
//! ```
//!
//! # Invariants
//!
//! 1. A scope only closes a session it opened itself. Scopes created inside
//!    an already-open step add to it and leave it open on drop.
//! 2. A [`SuspendGuard`] always issues exactly one `resume`.

use tracing::trace;

use crate::error::UndoResult;
use crate::manager::{ManagerState, UndoManager};

/// Suspends recording until dropped.
#[must_use = "recording resumes as soon as the guard is dropped"]
pub struct SuspendGuard {
    manager: UndoManager,
}

impl Drop for SuspendGuard {
    fn drop(&mut self) {
        self.manager.resume();
    }
}

/// Records one undo step for as long as it lives.
///
/// Dropping the scope accepts the step under its name. Call
/// [`cancel`](Self::cancel) to roll the work back instead.
#[must_use = "the step is accepted as soon as the scope is dropped"]
pub struct UndoScope {
    manager: UndoManager,
    name: String,
    owns_session: bool,
}

impl UndoScope {
    /// True when this scope opened the step and will close it.
    #[must_use]
    pub fn owns_session(&self) -> bool {
        self.owns_session
    }

    /// Accept now instead of at drop.
    pub fn accept(self) {
        drop(self);
    }

    /// Roll back the step instead of accepting it.
    ///
    /// Does nothing when the scope joined a step opened elsewhere.
    pub fn cancel(mut self) -> UndoResult {
        if !std::mem::take(&mut self.owns_session) {
            return Ok(());
        }
        self.manager.cancel()
    }
}

impl Drop for UndoScope {
    fn drop(&mut self) {
        if self.owns_session {
            self.manager.accept(&self.name);
        }
    }
}

/// Records one super-step for as long as it lives.
#[must_use = "the super step is accepted as soon as the scope is dropped"]
pub struct SuperUndoScope {
    manager: UndoManager,
    name: String,
    owns_session: bool,
}

impl SuperUndoScope {
    #[must_use]
    pub fn owns_session(&self) -> bool {
        self.owns_session
    }

    pub fn accept(self) {
        drop(self);
    }

    /// Roll back every step folded in so far.
    pub fn cancel(mut self) -> UndoResult {
        if !std::mem::take(&mut self.owns_session) {
            return Ok(());
        }
        self.manager.super_cancel()
    }
}

impl Drop for SuperUndoScope {
    fn drop(&mut self) {
        if self.owns_session {
            self.manager.super_accept(&self.name);
        }
    }
}

impl UndoManager {
    /// Suspend recording until the returned guard is dropped.
    pub fn suspend_guard(&self) -> SuspendGuard {
        self.suspend();
        SuspendGuard {
            manager: self.clone(),
        }
    }

    /// Open a step named `name` unless one is already open.
    ///
    /// While history is being replayed the scope is inert.
    pub fn scope(&self, name: impl Into<String>) -> UndoScope {
        let owns_session = matches!(
            self.state(),
            ManagerState::Idle | ManagerState::SuperRecording
        );
        let name = name.into();
        if owns_session {
            self.begin();
        } else {
            trace!(target: "undo_core", name = %name, "undo scope joined open session");
        }
        UndoScope {
            manager: self.clone(),
            name,
            owns_session,
        }
    }

    /// Open a super-step named `name` unless one is already open.
    pub fn super_scope(&self, name: impl Into<String>) -> SuperUndoScope {
        let owns_session = self.state() == ManagerState::Idle;
        let name = name.into();
        if owns_session {
            self.super_begin();
        } else {
            trace!(target: "undo_core", name = %name, "super scope joined open session");
        }
        SuperUndoScope {
            manager: self.clone(),
            name,
            owns_session,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::CallbackObject;
    use std::cell::Cell;
    use std::rc::Rc;

    fn record_set(manager: &UndoManager, cell: &Rc<Cell<i32>>, value: i32) {
        let old = cell.replace(value);
        let (c1, c2) = (cell.clone(), cell.clone());
        manager.record_undo(Box::new(
            CallbackObject::new("Set")
                .with_undo(move |_| {
                    c1.set(old);
                    Ok(())
                })
                .with_redo(move || {
                    c2.set(value);
                    Ok(())
                }),
        ));
    }

    #[test]
    fn scope_accepts_on_drop() {
        let mgr = UndoManager::new();
        let cell = Rc::new(Cell::new(0));
        {
            let scope = mgr.scope("Edit");
            assert!(scope.owns_session());
            record_set(&mgr, &cell, 3);
        }
        assert_eq!(mgr.undo_depth(), 1);
        assert_eq!(mgr.next_undo_name().as_deref(), Some("Edit"));
        assert_eq!(mgr.state(), ManagerState::Idle);
    }

    #[test]
    fn inner_scope_joins_outer() {
        let mgr = UndoManager::new();
        let cell = Rc::new(Cell::new(0));
        {
            let _outer = mgr.scope("Outer");
            record_set(&mgr, &cell, 1);
            {
                let inner = mgr.scope("Inner");
                assert!(!inner.owns_session());
                record_set(&mgr, &cell, 2);
            }
            assert_eq!(mgr.state(), ManagerState::Recording);
        }
        assert_eq!(mgr.undo_names(5), ["Outer"]);
        mgr.undo(1).unwrap();
        assert_eq!(cell.get(), 0);
    }

    #[test]
    fn scope_cancel_rolls_back() {
        let mgr = UndoManager::new();
        let cell = Rc::new(Cell::new(0));
        let scope = mgr.scope("Edit");
        record_set(&mgr, &cell, 9);
        scope.cancel().unwrap();
        assert_eq!(cell.get(), 0);
        assert_eq!(mgr.undo_depth(), 0);
        assert_eq!(mgr.state(), ManagerState::Idle);
    }

    #[test]
    fn scope_inside_super_scope_folds() {
        let mgr = UndoManager::new();
        let cell = Rc::new(Cell::new(0));
        {
            let _sup = mgr.super_scope("Macro");
            for v in 1..=3 {
                let _step = mgr.scope(format!("step {v}"));
                record_set(&mgr, &cell, v);
            }
        }
        assert_eq!(mgr.undo_depth(), 1);
        mgr.undo(1).unwrap();
        assert_eq!(cell.get(), 0);
    }

    #[test]
    fn super_scope_cancel() {
        let mgr = UndoManager::new();
        let cell = Rc::new(Cell::new(0));
        let sup = mgr.super_scope("Macro");
        mgr.scope("a").accept();
        {
            let _step = mgr.scope("b");
            record_set(&mgr, &cell, 5);
        }
        sup.cancel().unwrap();
        assert_eq!(cell.get(), 0);
        assert_eq!(mgr.undo_depth(), 0);
    }

    #[test]
    fn suspend_guard_resumes_on_drop() {
        let mgr = UndoManager::new();
        {
            let _a = mgr.suspend_guard();
            let _b = mgr.suspend_guard();
            assert!(mgr.is_suspended());
        }
        assert!(!mgr.is_suspended());
    }
}
