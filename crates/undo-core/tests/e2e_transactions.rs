#![forbid(unsafe_code)]

//! End-to-end recording and replay scenarios.
//!
//! Drives an [`UndoManager`] through a small document model whose setters
//! record their own undo objects, the way editor mutation hooks do. Every
//! replay therefore re-enters `record_undo`, which must be discarded.
//!
//! Run:
//!   cargo test -p undo-core --test e2e_transactions

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use undo_core::{
    HistoryStack, ManagerState, StackChange, StackEvent, TransactionListener, UndoError,
    UndoConfig, UndoManager, UndoObject, UndoResult,
};

// ============================================================================
// Document model
// ============================================================================

/// Named integer properties with change hooks wired to the manager.
#[derive(Clone)]
struct Document {
    props: Rc<RefCell<BTreeMap<String, i32>>>,
    manager: UndoManager,
    /// Number of hook-triggered records, including discarded ones.
    hook_calls: Rc<Cell<usize>>,
}

impl Document {
    fn new(manager: &UndoManager) -> Self {
        Self {
            props: Rc::default(),
            manager: manager.clone(),
            hook_calls: Rc::default(),
        }
    }

    fn get(&self, key: &str) -> i32 {
        self.props.borrow().get(key).copied().unwrap_or(0)
    }

    fn snapshot(&self) -> BTreeMap<String, i32> {
        self.props.borrow().clone()
    }

    /// Set a property and hand the change to the manager.
    fn set(&self, key: &str, value: i32) {
        let old = self.props.borrow_mut().insert(key.to_owned(), value).unwrap_or(0);
        self.hook_calls.set(self.hook_calls.get() + 1);
        self.manager.record_undo(Box::new(SetProp {
            doc: self.clone(),
            key: key.to_owned(),
            old,
            new: value,
        }));
    }
}

struct SetProp {
    doc: Document,
    key: String,
    old: i32,
    new: i32,
}

impl UndoObject for SetProp {
    fn undo(&mut self, _user_initiated: bool) -> UndoResult {
        // Goes through the hook on purpose.
        self.doc.set(&self.key, self.old);
        Ok(())
    }

    fn redo(&mut self) -> UndoResult {
        self.doc.set(&self.key, self.new);
        Ok(())
    }

    fn description(&self) -> &str {
        "Set property"
    }

    fn object_name(&self) -> &str {
        &self.key
    }
}

/// Object whose target vanished before it could be undone.
struct Orphan;

impl UndoObject for Orphan {
    fn undo(&mut self, _: bool) -> UndoResult {
        Err(UndoError::TargetNotFound("Brush7".into()))
    }

    fn redo(&mut self) -> UndoResult {
        Err(UndoError::TargetNotFound("Brush7".into()))
    }

    fn description(&self) -> &str {
        "Orphan"
    }
}

fn edit(manager: &UndoManager, doc: &Document, key: &str, value: i32, name: &str) {
    manager.begin();
    doc.set(key, value);
    manager.accept(name);
}

#[derive(Default)]
struct EventLog {
    transactions: Vec<&'static str>,
    stack: Vec<StackEvent>,
    modified: usize,
}

impl TransactionListener for EventLog {
    fn on_begin_transaction(&mut self) {
        self.transactions.push("begin");
    }
    fn on_end_transaction(&mut self) {
        self.transactions.push("end");
    }
    fn on_begin_restore(&mut self) {
        self.transactions.push("begin_restore");
    }
    fn on_end_restore(&mut self) {
        self.transactions.push("end_restore");
    }
    fn on_stack_changed(&mut self, event: &StackEvent) {
        self.stack.push(event.clone());
    }
    fn on_document_modified(&mut self) {
        self.modified += 1;
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn set_x_round_trip() {
    let mgr = UndoManager::new();
    let doc = Document::new(&mgr);

    mgr.begin();
    doc.set("x", 5);
    mgr.accept("Set X");
    assert_eq!((mgr.undo_depth(), mgr.redo_depth()), (1, 0));

    mgr.undo(1).unwrap();
    assert_eq!((mgr.undo_depth(), mgr.redo_depth()), (0, 1));
    assert_eq!(doc.get("x"), 0);

    mgr.redo(1).unwrap();
    assert_eq!((mgr.undo_depth(), mgr.redo_depth()), (1, 0));
    assert_eq!(doc.get("x"), 5);
}

#[test]
fn multi_object_step_round_trip() {
    let mgr = UndoManager::new();
    let doc = Document::new(&mgr);
    // Not recording: both records are dropped.
    doc.set("a", 1);
    doc.set("b", 0);
    let before = doc.snapshot();

    mgr.begin();
    doc.set("a", 2);
    doc.set("b", 3);
    doc.set("a", 4);
    mgr.accept("Batch");
    let after = doc.snapshot();

    mgr.undo(1).unwrap();
    assert_eq!(doc.snapshot(), before);
    mgr.redo(1).unwrap();
    assert_eq!(doc.snapshot(), after);
}

#[test]
fn new_edit_invalidates_redo_branch() {
    let mgr = UndoManager::new();
    let doc = Document::new(&mgr);
    edit(&mgr, &doc, "x", 1, "First");
    edit(&mgr, &doc, "x", 2, "Second");

    mgr.undo(1).unwrap();
    edit(&mgr, &doc, "y", 9, "New Edit");

    assert_eq!(mgr.redo_depth(), 0);
    assert_eq!(mgr.undo_names(10), ["New Edit (y)", "First (x)"]);

    // Nothing left to bring "Second" back.
    mgr.redo(1).unwrap();
    assert_eq!(doc.get("x"), 1);
}

#[test]
fn super_step_undoes_inner_steps_in_reverse() {
    let mgr = UndoManager::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    struct Tagged(&'static str, Rc<RefCell<Vec<&'static str>>>);
    impl UndoObject for Tagged {
        fn undo(&mut self, _: bool) -> UndoResult {
            self.1.borrow_mut().push(self.0);
            Ok(())
        }
        fn redo(&mut self) -> UndoResult {
            Ok(())
        }
        fn description(&self) -> &str {
            self.0
        }
    }

    mgr.super_begin();
    mgr.begin();
    mgr.record_undo(Box::new(Tagged("o", order.clone())));
    mgr.accept("n1");
    mgr.begin();
    mgr.record_undo(Box::new(Tagged("o2", order.clone())));
    mgr.accept("n2");
    mgr.super_accept("outer");

    mgr.undo(1).unwrap();
    assert_eq!(*order.borrow(), ["o2", "o"]);
    assert_eq!(mgr.redo_depth(), 1);
    assert_eq!(mgr.undo_depth(), 0);
}

#[test]
fn suspended_record_never_lands() {
    let mgr = UndoManager::new();
    let doc = Document::new(&mgr);

    mgr.begin();
    mgr.suspend();
    doc.set("x", 3);
    mgr.resume();
    mgr.accept("Hidden");

    assert_eq!(mgr.undo_depth(), 0);
    assert_eq!(doc.hook_calls.get(), 1);
}

#[test]
fn replay_hooks_are_discarded() {
    let mgr = UndoManager::new();
    let doc = Document::new(&mgr);
    for i in 1..=5 {
        edit(&mgr, &doc, "x", i, &format!("Set {i}"));
    }
    let calls_before = doc.hook_calls.get();

    mgr.undo(5).unwrap();
    assert_eq!(doc.get("x"), 0);
    assert_eq!(mgr.undo_depth(), 0);
    assert_eq!(mgr.redo_depth(), 5);
    // Each undo ran the hook once; none of it was filed.
    assert_eq!(doc.hook_calls.get(), calls_before + 5);

    mgr.redo(5).unwrap();
    assert_eq!(doc.get("x"), 5);
    assert_eq!(mgr.undo_depth(), 5);
    assert_eq!(mgr.redo_depth(), 0);
}

#[test]
fn cancel_restores_domain_and_leaves_stacks() {
    let mgr = UndoManager::new();
    let doc = Document::new(&mgr);
    edit(&mgr, &doc, "x", 1, "Keep");
    let log = Rc::new(RefCell::new(EventLog::default()));
    mgr.add_listener(log.clone());

    mgr.begin();
    doc.set("x", 2);
    doc.set("y", 3);
    mgr.cancel().unwrap();

    assert_eq!(doc.get("x"), 1);
    assert_eq!(doc.get("y"), 0);
    assert_eq!(mgr.undo_depth(), 1);
    assert_eq!(log.borrow().transactions, ["begin_restore", "end_restore"]);
    assert!(log.borrow().stack.is_empty());
}

#[test]
fn interactive_drag_with_restore() {
    let mgr = UndoManager::new();
    let doc = Document::new(&mgr);

    // Each mouse move re-applies the drag from its origin.
    mgr.begin();
    for offset in [3, 7, 12] {
        mgr.restore(true).unwrap();
        doc.set("pos", offset);
    }
    mgr.accept("Drag");

    assert_eq!(doc.get("pos"), 12);
    mgr.undo(1).unwrap();
    assert_eq!(doc.get("pos"), 0);
}

#[test]
fn listener_tracks_stack_positions() {
    let mgr = UndoManager::new();
    let doc = Document::new(&mgr);
    let log = Rc::new(RefCell::new(EventLog::default()));
    mgr.add_listener(log.clone());

    edit(&mgr, &doc, "a", 1, "A");
    edit(&mgr, &doc, "b", 1, "B");
    mgr.undo(2).unwrap();
    mgr.clear_redo_stack(1);

    let log = log.borrow();
    let summary: Vec<_> = log
        .stack
        .iter()
        .map(|e| (e.change, e.stack, e.index, e.name.as_str()))
        .collect();
    assert_eq!(
        summary,
        [
            (StackChange::Inserted, HistoryStack::Undo, 0, "A"),
            (StackChange::Inserted, HistoryStack::Undo, 1, "B"),
            (StackChange::Moved, HistoryStack::Redo, 0, "B"),
            (StackChange::Moved, HistoryStack::Redo, 1, "A"),
            (StackChange::Removed, HistoryStack::Redo, 1, "A"),
        ]
    );
    assert_eq!(log.transactions, ["begin", "end"]);
    assert_eq!(log.modified, 2);
    assert_eq!(log.stack[0].display_name, "A (a)");
}

#[test]
fn listener_may_query_manager_from_callback() {
    struct DepthWatcher {
        manager: UndoManager,
        seen: Vec<(usize, usize)>,
    }
    impl TransactionListener for DepthWatcher {
        fn on_stack_changed(&mut self, _: &StackEvent) {
            self.seen
                .push((self.manager.undo_depth(), self.manager.redo_depth()));
        }
    }

    let mgr = UndoManager::new();
    let doc = Document::new(&mgr);
    let watcher = Rc::new(RefCell::new(DepthWatcher {
        manager: mgr.clone(),
        seen: Vec::new(),
    }));
    mgr.add_listener(watcher.clone());

    edit(&mgr, &doc, "x", 1, "X");
    mgr.undo(1).unwrap();
    assert_eq!(watcher.borrow().seen, [(1, 0), (0, 1)]);
}

#[test]
fn failing_object_propagates_and_unwinds_flags() {
    let mgr = UndoManager::new();
    let doc = Document::new(&mgr);
    let log = Rc::new(RefCell::new(EventLog::default()));
    edit(&mgr, &doc, "x", 1, "Good");
    mgr.begin();
    mgr.record_undo(Box::new(Orphan));
    mgr.accept("Paint");
    mgr.add_listener(log.clone());

    let err = mgr.undo(2).unwrap_err();
    assert_eq!(err, UndoError::TargetNotFound("Brush7".into()));
    assert_eq!(mgr.state(), ManagerState::Idle);
    assert!(!mgr.is_suspended());
    assert_eq!(mgr.undo_depth(), 2);
    assert_eq!(mgr.next_undo_name().as_deref(), Some("Paint"));
    assert_eq!(log.borrow().transactions, ["begin", "end"]);

    // Recording works again right away.
    edit(&mgr, &doc, "y", 2, "After");
    assert_eq!(mgr.undo_depth(), 3);
}

#[test]
fn misuse_is_silent() {
    let mgr = UndoManager::new();
    let doc = Document::new(&mgr);

    mgr.accept("no begin");
    mgr.cancel().unwrap();
    mgr.super_accept("no super");
    mgr.super_cancel().unwrap();
    mgr.undo(3).unwrap();
    mgr.redo(3).unwrap();
    mgr.resume();
    mgr.clear_undo_stack(10);

    mgr.begin();
    doc.set("x", 1);
    mgr.undo(1).unwrap();
    assert_eq!(doc.get("x"), 1);
    mgr.accept("X");
    assert_eq!(mgr.undo_depth(), 1);
}

#[test]
fn flush_on_document_reload() {
    let mgr = UndoManager::new();
    let doc = Document::new(&mgr);
    edit(&mgr, &doc, "x", 1, "A");
    edit(&mgr, &doc, "x", 2, "B");
    mgr.undo(1).unwrap();
    let log = Rc::new(RefCell::new(EventLog::default()));
    mgr.add_listener(log.clone());

    mgr.flush();
    assert!(!mgr.can_undo());
    assert!(!mgr.can_redo());
    assert_eq!(log.borrow().stack.len(), 2);
    assert!(log
        .borrow()
        .stack
        .iter()
        .all(|e| e.change == StackChange::Removed));
}

#[test]
fn scopes_drive_sessions() {
    let mgr = UndoManager::new();
    let doc = Document::new(&mgr);
    {
        let _align = mgr.super_scope("Align");
        for (key, value) in [("a", 1), ("b", 2)] {
            let _step = mgr.scope("Move");
            doc.set(key, value);
        }
    }
    assert_eq!(mgr.undo_names(1), ["Align (a, b)"]);
    mgr.undo(1).unwrap();
    assert_eq!((doc.get("a"), doc.get("b")), (0, 0));
}

#[test]
fn configured_display_names_reach_listeners_and_queries() {
    let config = UndoConfig::default()
        .with_display_width(24)
        .with_multiple_objects_label("(Many)");
    let mgr = UndoManager::with_config(config.clone());
    assert_eq!(mgr.config(), config);

    let doc = Document::new(&mgr);
    let log = Rc::new(RefCell::new(EventLog::default()));
    mgr.add_listener(log.clone());

    mgr.begin();
    for key in ["alpha", "beta", "gamma", "delta"] {
        doc.set(key, 1);
    }
    mgr.accept("Reset");
    edit(&mgr, &doc, "x", 2, "Nudge");

    assert_eq!(mgr.undo_names(2), ["Nudge (x)", "Reset (Many)"]);
    mgr.undo(2).unwrap();
    assert_eq!(mgr.next_redo_name().as_deref(), Some("Reset (Many)"));

    let log = log.borrow();
    let names: Vec<_> = log.stack.iter().map(|e| e.display_name.as_str()).collect();
    assert_eq!(
        names,
        ["Reset (Many)", "Nudge (x)", "Nudge (x)", "Reset (Many)"]
    );
}
