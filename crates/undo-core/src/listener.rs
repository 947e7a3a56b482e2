#![forbid(unsafe_code)]

//! Observers of the undo manager.
//!
//! Listeners are told when a replay (`undo`/`redo`) or a silent restore
//! (`cancel`, `restore`, `super_cancel`) starts and ends, so they can batch
//! expensive refreshes, and when an entry enters, leaves or moves between
//! the stacks, so history panels can update incrementally.
//!
//! # Failure Modes
//!
//! - **Re-entrant notification**: a listener that triggers another undo or
//!   redo from inside a callback is notified again while its own `RefCell`
//!   is still borrowed, which panics. Listeners may query the manager or
//!   record new work, but must not replay history from a callback.

use std::cell::RefCell;
use std::rc::Rc;

/// What happened to a stack entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackChange {
    /// A new entry was filed on the undo stack.
    Inserted,
    /// An entry was evicted and dropped.
    Removed,
    /// An entry moved between the stacks by `undo` or `redo`.
    Moved,
}

/// Which stack an event's index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStack {
    Undo,
    Redo,
}

/// A change to one of the history stacks.
///
/// `index` is the entry's position in `stack` counted from the front (oldest
/// for the undo stack): where it now sits for `Inserted` and `Moved`, where
/// it sat for `Removed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackEvent {
    pub change: StackChange,
    pub stack: HistoryStack,
    pub index: usize,
    /// Entry name as given to `accept`.
    pub name: String,
    /// Entry name with its object names, as shown in menus.
    pub display_name: String,
}

/// Observer notified around history replay and stack changes.
///
/// All methods default to no-ops.
pub trait TransactionListener {
    /// An `undo` or `redo` is about to run.
    fn on_begin_transaction(&mut self) {}

    /// The `undo` or `redo` finished (also fired when it failed).
    fn on_end_transaction(&mut self) {}

    /// A recording is about to be rolled back in place.
    fn on_begin_restore(&mut self) {}

    /// The rollback finished.
    fn on_end_restore(&mut self) {}

    /// An entry was inserted, removed or moved.
    fn on_stack_changed(&mut self, _event: &StackEvent) {}

    /// A step was accepted; the owning document now has unsaved changes.
    fn on_document_modified(&mut self) {}
}

/// Shared handle to a registered listener.
pub type ListenerRef = Rc<RefCell<dyn TransactionListener>>;

/// Identifies a registered listener for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

impl ListenerId {
    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// A notification waiting to be delivered once the manager's borrow ends.
#[derive(Debug, Clone)]
pub(crate) enum Notice {
    BeginTransaction,
    EndTransaction,
    BeginRestore,
    EndRestore,
    Stack(StackEvent),
    DocumentModified,
}

pub(crate) fn dispatch(listeners: &[ListenerRef], notices: &[Notice]) {
    for notice in notices {
        for listener in listeners {
            let mut listener = listener.borrow_mut();
            match notice {
                Notice::BeginTransaction => listener.on_begin_transaction(),
                Notice::EndTransaction => listener.on_end_transaction(),
                Notice::BeginRestore => listener.on_begin_restore(),
                Notice::EndRestore => listener.on_end_restore(),
                Notice::Stack(event) => listener.on_stack_changed(event),
                Notice::DocumentModified => listener.on_document_modified(),
            }
        }
    }
}
