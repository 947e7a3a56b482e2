#![forbid(unsafe_code)]

//! Transactional undo/redo for interactive editors.
//!
//! Editor features describe every reversible mutation as an
//! [`UndoObject`] and hand it to an [`UndoManager`] while a recording
//! session is open. Accepting the session files the recorded objects as one
//! [`UndoStep`]; the manager then moves whole steps between its undo and
//! redo stacks on request.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         UndoManager                          │
//! │                                                              │
//! │  begin ─► record_undo ─► accept(name)                        │
//! │              │                 │                             │
//! │        ┌─────▼──────┐   ┌──────▼───────┐   ┌──────────────┐  │
//! │        │  open step │   │  Undo Stack  │   │  Redo Stack  │  │
//! │        │ obj1, obj2 │   │  step3       │   │  step4       │  │
//! │        └────────────┘   │  super2  ────┼──►│              │  │
//! │                         │  step1       │◄──┼──  redo()    │  │
//! │                         └──────────────┘   └──────────────┘  │
//! │                               undo()                         │
//! │  listeners ◄── begin/end transaction, stack changes          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use undo_core::{CallbackObject, UndoManager};
//!
//! let manager = UndoManager::new();
//! let x = Rc::new(Cell::new(0));
//!
//! manager.begin();
//! x.set(5);
//! let (u, r) = (x.clone(), x.clone());
//! manager.record_undo(Box::new(
//!     CallbackObject::new("Set X")
//!         .with_undo(move |_| {
//!             u.set(0);
//!             Ok(())
//!         })
//!         .with_redo(move || {
//!             r.set(5);
//!             Ok(())
//!         }),
//! ));
//! manager.accept("Set X");
//!
//! manager.undo(1).unwrap();
//! assert_eq!(x.get(), 0);
//! manager.redo(1).unwrap();
//! assert_eq!(x.get(), 5);
//! ```
//!
//! # Modules
//!
//! - [`object`]: the [`UndoObject`] capability and [`CallbackObject`]
//! - [`step`]: [`UndoStep`], [`SuperStep`] and stack entries
//! - [`manager`]: the [`UndoManager`] state machine
//! - [`guard`]: scope guards for sessions and suspension
//! - [`listener`]: [`TransactionListener`] notifications
//! - [`config`]: display-name settings
//! - [`error`]: error types

pub mod config;
pub mod error;
pub mod guard;
pub mod listener;
pub mod manager;
pub mod object;
pub mod step;

pub use config::UndoConfig;
pub use error::{ConfigError, UndoError, UndoResult};
pub use guard::{SuperUndoScope, SuspendGuard, UndoScope};
pub use listener::{
    HistoryStack, ListenerId, ListenerRef, StackChange, StackEvent, TransactionListener,
};
pub use manager::{CoalesceRule, ManagerState, UndoManager};
pub use object::{CallbackObject, UndoObject};
pub use step::{SuperStep, UndoEntry, UndoStep};
