#![forbid(unsafe_code)]

//! Transactional undo/redo manager.
//!
//! [`UndoManager`] owns the undo and redo stacks, runs the recording
//! sessions that produce their entries, and replays history on request.
//!
//! # State Machine
//!
//! ```text
//!            begin()                    super_begin()
//!   Idle ─────────────► Recording     Idle ─────────────► SuperRecording
//!    ▲                      │          ▲                    │   ▲
//!    └── accept()/cancel() ─┘          └─ super_accept()/ ──┘   │ begin()/accept()
//!                                         super_cancel()        ▼ (nested Recording,
//!   Idle ── undo(n) ──► Undoing ──► Idle                          steps fold into
//!   Idle ── redo(n) ──► Redoing ──► Idle                          the super-step)
//! ```
//!
//! Every call made in the wrong state is a silent no-op.
//!
//! # Invariants
//!
//! 1. Nothing is recorded while undoing, redoing or suspended; such records
//!    are dropped on arrival.
//! 2. Nested `begin` calls are flattened into the outermost step.
//! 3. Accepting a non-empty step clears the redo stack (linear history).
//! 4. Empty steps and super-steps are never filed.
//! 5. `undo`/`redo` are refused while a recording is open.
//! 6. The replay flag and the suspend bracket span the whole `undo(n)` or
//!    `redo(n)` call, not single entries, and are released even when an
//!    object fails or panics.
//!
//! # Reentrancy
//!
//! The manager is a cheap-to-clone handle over shared interior state. The
//! interior is only borrowed for bookkeeping and never while an
//! [`UndoObject`], the coalesce rule or a listener runs. Display names and
//! sizes are read from objects once, when their entry is filed, and objects
//! are dropped after the borrow ends. Objects may therefore call back into
//! the same manager (typically `record_undo` from a mutation hook) while
//! being replayed. Those calls are answered by the state machine, not by a
//! `RefCell` panic.
//!
//! ```text
//! undo(1)
//! ┌──────────────────────────────────────────────┐
//! │ Undo Stack: [s1, s2]   ──pop s2──►           │
//! │ s2.undo(true)  ── hooks call record_undo ──► │ dropped (Undoing)
//! │ Redo Stack: [s2]                              │
//! └──────────────────────────────────────────────┘
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, error, trace, warn};
use web_time::Instant;

use crate::config::UndoConfig;
use crate::error::UndoResult;
use crate::listener::{
    HistoryStack, ListenerId, ListenerRef, Notice, StackChange, StackEvent, dispatch,
};
use crate::object::UndoObject;
use crate::step::{SuperStep, UndoEntry, UndoStep};

/// Predicate selecting "whole subsystem" objects that coalesce within a
/// step: when it matches an incoming object and the open step already holds
/// a matching object with the same description, the incoming one is dropped.
pub type CoalesceRule = Rc<dyn Fn(&dyn UndoObject) -> bool>;

/// Externally visible state of the manager.
///
/// While a step is open inside a super-step, the state is `Recording`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Idle,
    Recording,
    SuperRecording,
    Undoing,
    Redoing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replay {
    Idle,
    Undoing,
    Redoing,
}

impl Replay {
    fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Undoing => "undo",
            Self::Redoing => "redo",
        }
    }
}

/// A stack entry with the facts listeners and queries need, computed once
/// when it is filed.
struct Filed {
    entry: UndoEntry,
    display_name: String,
    size_bytes: usize,
}

impl Filed {
    /// Calls into the entry's objects; never run under the interior borrow.
    fn new(entry: UndoEntry, config: &UndoConfig) -> Self {
        Self {
            display_name: entry.display_name(config),
            size_bytes: entry.size_bytes(),
            entry,
        }
    }
}

struct Inner {
    /// Entries available for undo (newest at back).
    undo_stack: VecDeque<Filed>,
    /// Entries available for redo (most recently undone at back).
    redo_stack: VecDeque<Filed>,
    current: Option<UndoStep>,
    current_super: Option<SuperStep>,
    replay: Replay,
    suspend_count: u32,
    modified: bool,
    listeners: Vec<(ListenerId, ListenerRef)>,
    next_listener_id: u64,
    coalesce: Option<CoalesceRule>,
    config: UndoConfig,
}

impl Inner {
    fn new(config: UndoConfig) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            current: None,
            current_super: None,
            replay: Replay::Idle,
            suspend_count: 0,
            modified: false,
            listeners: Vec::new(),
            next_listener_id: 0,
            coalesce: None,
            config,
        }
    }

    fn is_replaying(&self) -> bool {
        self.replay != Replay::Idle
    }

    fn state(&self) -> ManagerState {
        match self.replay {
            Replay::Undoing => ManagerState::Undoing,
            Replay::Redoing => ManagerState::Redoing,
            Replay::Idle if self.current.is_some() => ManagerState::Recording,
            Replay::Idle if self.current_super.is_some() => ManagerState::SuperRecording,
            Replay::Idle => ManagerState::Idle,
        }
    }

    /// Why a record arriving now would be dropped, if it would be.
    fn record_gate(&self) -> Option<&'static str> {
        if self.is_replaying() {
            Some("replaying")
        } else if self.suspend_count > 0 {
            Some("suspended")
        } else if self.current.is_none() {
            Some("not_recording")
        } else {
            None
        }
    }

    /// Append `obj` to the open step, or hand it back with the reason.
    fn admit(
        &mut self,
        obj: Box<dyn UndoObject>,
        key: Option<String>,
    ) -> Result<(), (Box<dyn UndoObject>, &'static str)> {
        if let Some(reason) = self.record_gate() {
            return Err((obj, reason));
        }
        match self.current.as_mut() {
            Some(step) => step.push_keyed(obj, key).map_err(|obj| (obj, "coalesced")),
            None => Err((obj, "not_recording")),
        }
    }

    /// Evict up to `count` entries from the front of the undo stack.
    fn evict_undo(&mut self, count: usize, notices: &mut Vec<Notice>) -> Vec<Filed> {
        let mut removed = Vec::new();
        while removed.len() < count {
            let Some(filed) = self.undo_stack.pop_front() else {
                break;
            };
            notices.push(stack_notice(StackChange::Removed, HistoryStack::Undo, 0, &filed));
            removed.push(filed);
        }
        removed
    }

    /// Evict up to `count` entries from the back of the redo stack.
    fn evict_redo(&mut self, count: usize, notices: &mut Vec<Notice>) -> Vec<Filed> {
        let mut removed = Vec::new();
        while removed.len() < count {
            let Some(filed) = self.redo_stack.pop_back() else {
                break;
            };
            let index = self.redo_stack.len();
            notices.push(stack_notice(StackChange::Removed, HistoryStack::Redo, index, &filed));
            removed.push(filed);
        }
        removed
    }

    fn file(&mut self, filed: Filed) -> Notice {
        self.undo_stack.push_back(filed);
        let index = self.undo_stack.len() - 1;
        stack_notice(
            StackChange::Inserted,
            HistoryStack::Undo,
            index,
            &self.undo_stack[index],
        )
    }

    fn take_for_replay(&mut self, direction: Replay) -> Option<Filed> {
        match direction {
            Replay::Undoing => self.undo_stack.pop_back(),
            Replay::Redoing => self.redo_stack.pop_back(),
            Replay::Idle => None,
        }
    }

    /// File a replayed entry on the opposite stack.
    fn finish_replay(&mut self, direction: Replay, filed: Filed) -> Notice {
        let (stack, target) = match direction {
            Replay::Redoing => (&mut self.undo_stack, HistoryStack::Undo),
            _ => (&mut self.redo_stack, HistoryStack::Redo),
        };
        stack.push_back(filed);
        let index = stack.len() - 1;
        stack_notice(StackChange::Moved, target, index, &stack[index])
    }

    /// Put an entry whose replay did not complete back where it came from.
    fn abort_replay(&mut self, direction: Replay, filed: Filed) {
        match direction {
            Replay::Redoing => self.redo_stack.push_back(filed),
            _ => self.undo_stack.push_back(filed),
        }
    }
}

fn stack_notice(change: StackChange, stack: HistoryStack, index: usize, filed: &Filed) -> Notice {
    Notice::Stack(StackEvent {
        change,
        stack,
        index,
        name: filed.entry.name().to_owned(),
        display_name: filed.display_name.clone(),
    })
}

/// Transactional undo/redo manager.
///
/// Cloning an `UndoManager` creates a new handle to the **same** history, so
/// the handle can be given to every editor feature that records work.
pub struct UndoManager {
    inner: Rc<RefCell<Inner>>,
}

// Manual Clone: shares the same Rc.
impl Clone for UndoManager {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for UndoManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("UndoManager")
            .field("undo_depth", &inner.undo_stack.len())
            .field("redo_depth", &inner.redo_stack.len())
            .field("recording", &inner.current.is_some())
            .field("super_recording", &inner.current_super.is_some())
            .field("replay", &inner.replay)
            .field("suspend_count", &inner.suspend_count)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoManager {
    /// Create an empty manager with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(UndoConfig::default())
    }

    /// Create an empty manager with the given configuration.
    #[must_use]
    pub fn with_config(config: UndoConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner::new(config))),
        }
    }

    // ========================================================================
    // Recording
    // ========================================================================

    /// Open a recording session.
    ///
    /// Ignored while undoing or redoing. A `begin` inside an open session is
    /// merged into it: everything lands in the outermost step.
    pub fn begin(&self) {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        if inner.is_replaying() {
            trace!(target: "undo_core", replay = inner.replay.label(), "begin ignored during replay");
            return;
        }
        if inner.current.is_some() {
            trace!(target: "undo_core", "nested begin merged into open step");
            return;
        }
        inner.current = Some(UndoStep::new());
        debug!(
            target: "undo_core",
            super_recording = inner.current_super.is_some(),
            "undo recording started"
        );
    }

    /// Hand a reversible mutation to the open step.
    ///
    /// The object is dropped instead when nothing is recording, recording is
    /// suspended, history is being replayed, or the coalesce rule rejects it.
    pub fn record_undo(&self, obj: Box<dyn UndoObject>) {
        let (gate, rule) = {
            let inner = self.inner.borrow();
            (inner.record_gate(), inner.coalesce.clone())
        };
        let outcome = match gate {
            Some(reason) => Err((obj, reason)),
            None => {
                let key = match rule {
                    Some(rule) if rule(obj.as_ref()) => Some(obj.description().to_owned()),
                    _ => None,
                };
                // The rule may have re-entered the manager; admit re-checks.
                self.inner.borrow_mut().admit(obj, key)
            }
        };
        if let Err((obj, reason)) = outcome {
            trace!(
                target: "undo_core",
                reason,
                description = obj.description(),
                "undo record discarded"
            );
        }
    }

    /// Close the open step and file it under `name`.
    ///
    /// An empty step is discarded. Otherwise the redo stack is cleared and
    /// the step goes onto the undo stack, or into the open super-step.
    pub fn accept(&self, name: &str) {
        let (mut step, into_super, config) = {
            let mut inner = self.inner.borrow_mut();
            if inner.is_replaying() {
                return;
            }
            let Some(step) = inner.current.take() else {
                return;
            };
            (step, inner.current_super.is_some(), inner.config.clone())
        };
        if step.is_empty() {
            debug!(target: "undo_core", name, "empty undo step discarded");
            return;
        }
        step.set_name(name);
        let objects = step.len();
        let entry = if into_super {
            Err(step)
        } else {
            Ok(Filed::new(UndoEntry::Step(step), &config))
        };

        let mut notices = Vec::new();
        let garbage = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            let invalidated = inner.evict_redo(usize::MAX, &mut notices);
            let mut stray = None;
            match entry {
                Ok(filed) => notices.push(inner.file(filed)),
                Err(step) => match inner.current_super.as_mut() {
                    Some(sup) => sup.push(step),
                    None => stray = Some(step),
                },
            }
            inner.modified = true;
            notices.push(Notice::DocumentModified);
            (invalidated, stray)
        };
        debug!(
            target: "undo_core",
            name,
            objects,
            redo_cleared = garbage.0.len(),
            into_super,
            "undo step accepted"
        );
        drop(garbage);
        self.notify(&notices);
    }

    /// Close the open step and roll its objects back in place.
    ///
    /// Objects are reversed with `undo(false)`, last first, while recording
    /// is suspended. Neither stack is touched.
    pub fn cancel(&self) -> UndoResult {
        let mut step = {
            let mut inner = self.inner.borrow_mut();
            if inner.is_replaying() {
                return Ok(());
            }
            let Some(step) = inner.current.take() else {
                return Ok(());
            };
            step
        };
        debug!(target: "undo_core", objects = step.len(), "undo recording cancelled");
        if step.is_empty() {
            return Ok(());
        }
        self.roll_back(|| step.undo(false))
    }

    /// Roll back everything recorded so far while keeping the session open.
    ///
    /// With `revert == false` the recorded objects are only discarded. Used
    /// by interactive tools that re-apply a whole drag from its start.
    pub fn restore(&self, revert: bool) -> UndoResult {
        let mut taken = {
            let mut inner = self.inner.borrow_mut();
            if inner.is_replaying() {
                return Ok(());
            }
            let Some(step) = inner.current.as_mut() else {
                return Ok(());
            };
            step.take_objects()
        };
        debug!(target: "undo_core", objects = taken.len(), revert, "undo recording restored");
        if taken.is_empty() || !revert {
            return Ok(());
        }
        self.roll_back(|| taken.undo(false))
    }

    /// Open a super-step: subsequent accepted steps fold into it.
    pub fn super_begin(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.is_replaying() {
            return;
        }
        if inner.current_super.is_some() {
            trace!(target: "undo_core", "nested super_begin merged into open super step");
            return;
        }
        inner.current_super = Some(SuperStep::new());
        debug!(target: "undo_core", "super recording started");
    }

    /// Close the super-step and file it under `name`.
    ///
    /// An open inner step is accepted under the same name first. An empty
    /// super-step is discarded.
    pub fn super_accept(&self, name: &str) {
        {
            let inner = self.inner.borrow();
            if inner.current_super.is_none() || inner.is_replaying() {
                return;
            }
        }
        self.accept(name);

        let (taken, config) = {
            let mut inner = self.inner.borrow_mut();
            (inner.current_super.take(), inner.config.clone())
        };
        let Some(mut sup) = taken else {
            return;
        };
        if sup.is_empty() {
            debug!(target: "undo_core", name, "empty super step discarded");
            return;
        }
        sup.set_name(name);
        let steps = sup.len();
        let filed = Filed::new(UndoEntry::Super(sup), &config);
        let notice = self.inner.borrow_mut().file(filed);
        debug!(target: "undo_core", name, steps, "super step accepted");
        self.notify(&[notice]);
    }

    /// Close the super-step and roll all of its steps back.
    ///
    /// An open inner step is cancelled first. The super-step is always
    /// closed; the first failure is returned.
    pub fn super_cancel(&self) -> UndoResult {
        {
            let inner = self.inner.borrow();
            if inner.current_super.is_none() || inner.is_replaying() {
                return Ok(());
            }
        }
        let inner_result = self.cancel();

        let taken = self.inner.borrow_mut().current_super.take();
        let Some(mut sup) = taken else {
            return inner_result;
        };
        debug!(target: "undo_core", steps = sup.len(), "super recording cancelled");
        if sup.is_empty() {
            return inner_result;
        }
        let result = self.roll_back(|| sup.undo(false));
        inner_result.and(result)
    }

    // ========================================================================
    // Replay
    // ========================================================================

    /// Undo up to `count` entries.
    ///
    /// Refused while undoing, redoing or recording. A failing entry is put
    /// back on the undo stack and its error returned; entries undone before
    /// it stay on the redo stack. An entry whose object panics is put back
    /// the same way before the panic continues.
    pub fn undo(&self, count: usize) -> UndoResult {
        self.replay(Replay::Undoing, count)
    }

    /// Redo up to `count` entries. Mirror of [`undo`](Self::undo).
    pub fn redo(&self, count: usize) -> UndoResult {
        self.replay(Replay::Redoing, count)
    }

    fn replay(&self, direction: Replay, count: usize) -> UndoResult {
        {
            let inner = self.inner.borrow();
            if inner.is_replaying() || inner.current.is_some() || inner.current_super.is_some() {
                trace!(
                    target: "undo_core",
                    direction = direction.label(),
                    state = ?inner.state(),
                    "replay refused"
                );
                return Ok(());
            }
        }

        let start = Instant::now();
        let span = tracing::debug_span!(
            target: "undo_core",
            "undo.replay",
            direction = direction.label(),
            requested = count as u64,
            applied = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        )
        .entered();

        self.notify(&[Notice::BeginTransaction]);
        let mut applied = 0_u64;
        let result = {
            let _replaying = ReplayFlag::raise(self, direction);
            let _suspended = self.suspend_guard();
            let mut result = Ok(());
            for _ in 0..count {
                let taken = self.inner.borrow_mut().take_for_replay(direction);
                let Some(filed) = taken else {
                    break;
                };
                let mut in_flight = InFlight {
                    manager: self,
                    direction,
                    filed: Some(filed),
                };
                match in_flight.apply() {
                    Ok(()) => {
                        let notice = in_flight.land();
                        self.notify(notice.as_slice());
                        applied += 1;
                    }
                    Err(err) => {
                        error!(
                            target: "undo_core",
                            direction = direction.label(),
                            entry = in_flight.name(),
                            super_step = in_flight.is_super(),
                            error = %err,
                            "history replay failed"
                        );
                        drop(in_flight);
                        result = Err(err);
                        break;
                    }
                }
            }
            result
        };

        span.record("applied", applied);
        span.record("duration_us", start.elapsed().as_micros() as u64);
        self.notify(&[Notice::EndTransaction]);
        result
    }

    // ========================================================================
    // Suspension
    // ========================================================================

    /// Stop accepting records until the matching [`resume`](Self::resume).
    /// Nests additively.
    pub fn suspend(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.suspend_count += 1;
        trace!(target: "undo_core", depth = inner.suspend_count, "undo suspended");
    }

    /// Undo one [`suspend`](Self::suspend). Unbalanced calls are ignored.
    pub fn resume(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.suspend_count == 0 {
            warn!(target: "undo_core", "resume without matching suspend");
            return;
        }
        inner.suspend_count -= 1;
        trace!(target: "undo_core", depth = inner.suspend_count, "undo resumed");
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Evict up to `count` of the oldest undo entries. Ignored during replay.
    pub fn clear_undo_stack(&self, count: usize) {
        let mut notices = Vec::new();
        let removed = {
            let mut inner = self.inner.borrow_mut();
            if inner.is_replaying() {
                trace!(target: "undo_core", "clear_undo_stack ignored during replay");
                return;
            }
            inner.evict_undo(count, &mut notices)
        };
        debug!(target: "undo_core", removed = removed.len(), "undo stack cleared");
        drop(removed);
        self.notify(&notices);
    }

    /// Evict up to `count` of the most recently undone redo entries.
    /// Ignored during replay.
    pub fn clear_redo_stack(&self, count: usize) {
        let mut notices = Vec::new();
        let removed = {
            let mut inner = self.inner.borrow_mut();
            if inner.is_replaying() {
                trace!(target: "undo_core", "clear_redo_stack ignored during replay");
                return;
            }
            inner.evict_redo(count, &mut notices)
        };
        debug!(target: "undo_core", removed = removed.len(), "redo stack cleared");
        drop(removed);
        self.notify(&notices);
    }

    /// Hard reset: drop both stacks and any open recording, zero the suspend
    /// count and clear the modified flag.
    ///
    /// Ignored while undoing or redoing; the entry being replayed would
    /// otherwise land on a stack that was just emptied.
    pub fn flush(&self) {
        let mut notices = Vec::new();
        let garbage = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            if inner.is_replaying() {
                warn!(
                    target: "undo_core",
                    replay = inner.replay.label(),
                    "flush ignored during replay"
                );
                return;
            }
            let redo = inner.evict_redo(usize::MAX, &mut notices);
            let undo = inner.evict_undo(usize::MAX, &mut notices);
            let current = inner.current.take();
            let current_super = inner.current_super.take();
            inner.suspend_count = 0;
            inner.modified = false;
            (redo, undo, current, current_super)
        };
        debug!(
            target: "undo_core",
            redo = garbage.0.len(),
            undo = garbage.1.len(),
            "undo history flushed"
        );
        drop(garbage);
        self.notify(&notices);
    }

    // ========================================================================
    // Listeners and policy
    // ========================================================================

    /// Register a listener. Listeners are notified in registration order.
    pub fn add_listener(&self, listener: ListenerRef) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_listener_id);
        inner.next_listener_id += 1;
        inner.listeners.push((id, listener));
        id
    }

    /// Unregister a listener. Returns false when `id` is unknown.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            let position = inner.listeners.iter().position(|(lid, _)| *lid == id);
            position.map(|i| inner.listeners.remove(i))
        };
        removed.is_some()
    }

    /// Install the rule deciding which objects coalesce within a step.
    ///
    /// The rule runs with the manager released and may query it.
    pub fn set_coalesce_rule<F>(&self, rule: F)
    where
        F: Fn(&dyn UndoObject) -> bool + 'static,
    {
        let previous = self.inner.borrow_mut().coalesce.replace(Rc::new(rule));
        drop(previous);
    }

    /// Remove the coalesce rule; every record is kept.
    pub fn clear_coalesce_rule(&self) {
        let previous = self.inner.borrow_mut().coalesce.take();
        drop(previous);
    }

    fn notify(&self, notices: &[Notice]) {
        if notices.is_empty() {
            return;
        }
        // Snapshot so listeners run without the interior borrowed.
        let listeners: Vec<ListenerRef> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        dispatch(&listeners, notices);
    }

    /// Reverse in-progress work under the restore notifications with
    /// recording suspended.
    fn roll_back(&self, undo: impl FnOnce() -> UndoResult) -> UndoResult {
        self.notify(&[Notice::BeginRestore]);
        let result = {
            let _suspended = self.suspend_guard();
            undo()
        };
        self.notify(&[Notice::EndRestore]);
        if let Err(err) = &result {
            error!(target: "undo_core", error = %err, "rollback of open recording failed");
        }
        result
    }

    // ========================================================================
    // Info
    // ========================================================================

    #[must_use]
    pub fn state(&self) -> ManagerState {
        self.inner.borrow().state()
    }

    /// True while a step or super-step is open and recording is not
    /// suspended.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        let inner = self.inner.borrow();
        (inner.current.is_some() || inner.current_super.is_some()) && inner.suspend_count == 0
    }

    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.inner.borrow().suspend_count > 0
    }

    /// True while a step or super-step is open, suspended or not.
    #[must_use]
    pub fn is_transaction_open(&self) -> bool {
        let inner = self.inner.borrow();
        inner.current.is_some() || inner.current_super.is_some()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.inner.borrow().undo_stack.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.inner.borrow().redo_stack.is_empty()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.inner.borrow().undo_stack.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.inner.borrow().redo_stack.len()
    }

    /// Display names of undo entries, most recent first.
    #[must_use]
    pub fn undo_names(&self, limit: usize) -> Vec<String> {
        let inner = self.inner.borrow();
        inner
            .undo_stack
            .iter()
            .rev()
            .take(limit)
            .map(|f| f.display_name.clone())
            .collect()
    }

    /// Display names of redo entries, most recent first.
    #[must_use]
    pub fn redo_names(&self, limit: usize) -> Vec<String> {
        let inner = self.inner.borrow();
        inner
            .redo_stack
            .iter()
            .rev()
            .take(limit)
            .map(|f| f.display_name.clone())
            .collect()
    }

    /// Display name of the entry the next `undo(1)` would reverse.
    #[must_use]
    pub fn next_undo_name(&self) -> Option<String> {
        let inner = self.inner.borrow();
        inner.undo_stack.back().map(|f| f.display_name.clone())
    }

    /// Display name of the entry the next `redo(1)` would replay.
    #[must_use]
    pub fn next_redo_name(&self) -> Option<String> {
        let inner = self.inner.borrow();
        inner.redo_stack.back().map(|f| f.display_name.clone())
    }

    /// Approximate bytes held by both stacks, as reported when each entry
    /// was filed.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        let inner = self.inner.borrow();
        inner
            .undo_stack
            .iter()
            .chain(inner.redo_stack.iter())
            .map(|f| f.size_bytes)
            .sum()
    }

    /// True once a step was accepted since the last flush or
    /// `set_modified(false)`.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.inner.borrow().modified
    }

    /// Set the document-modified flag (e.g. clear it after saving).
    pub fn set_modified(&self, modified: bool) {
        self.inner.borrow_mut().modified = modified;
    }

    /// Configuration the manager was built with.
    #[must_use]
    pub fn config(&self) -> UndoConfig {
        self.inner.borrow().config.clone()
    }
}

/// Holds the replay flag for the duration of an `undo`/`redo` call.
struct ReplayFlag {
    manager: UndoManager,
}

impl ReplayFlag {
    fn raise(manager: &UndoManager, direction: Replay) -> Self {
        manager.inner.borrow_mut().replay = direction;
        Self {
            manager: manager.clone(),
        }
    }
}

impl Drop for ReplayFlag {
    fn drop(&mut self) {
        self.manager.inner.borrow_mut().replay = Replay::Idle;
    }
}

/// An entry popped for replay. Returned to its origin stack on drop unless
/// it [`land`](Self::land)s on the opposite one.
struct InFlight<'a> {
    manager: &'a UndoManager,
    direction: Replay,
    filed: Option<Filed>,
}

impl InFlight<'_> {
    fn apply(&mut self) -> UndoResult {
        let Some(filed) = self.filed.as_mut() else {
            return Ok(());
        };
        match self.direction {
            Replay::Redoing => filed.entry.redo(),
            _ => filed.entry.undo(true),
        }
    }

    fn land(mut self) -> Option<Notice> {
        let filed = self.filed.take()?;
        Some(
            self.manager
                .inner
                .borrow_mut()
                .finish_replay(self.direction, filed),
        )
    }

    fn name(&self) -> &str {
        self.filed.as_ref().map_or("", |f| f.entry.name())
    }

    fn is_super(&self) -> bool {
        self.filed.as_ref().is_some_and(|f| f.entry.is_super())
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(filed) = self.filed.take() {
            self.manager
                .inner
                .borrow_mut()
                .abort_replay(self.direction, filed);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
