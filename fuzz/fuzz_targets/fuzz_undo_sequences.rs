#![no_main]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use undo_core::{CallbackObject, ManagerState, UndoError, UndoManager};

#[derive(Arbitrary, Debug)]
enum Op {
    Begin,
    Accept,
    Cancel,
    Restore(bool),
    SuperBegin,
    SuperAccept,
    SuperCancel,
    /// Record a write to one of the cells; `fail` makes its undo error out.
    Record { slot: u8, value: i16, fail: bool },
    Undo(u8),
    Redo(u8),
    Suspend,
    Resume,
    ClearUndo(u8),
    ClearRedo(u8),
    Flush,
}

struct Harness {
    manager: UndoManager,
    cells: Rc<RefCell<[i16; 4]>>,
    /// Records made from inside undo/redo callbacks.
    echoes: Rc<Cell<u32>>,
}

impl Harness {
    fn record(&self, slot: u8, value: i16, fail: bool) {
        let slot = usize::from(slot % 4);
        let old = std::mem::replace(&mut self.cells.borrow_mut()[slot], value);
        let (undo_cells, redo_cells) = (self.cells.clone(), self.cells.clone());
        let (undo_mgr, redo_mgr) = (self.manager.clone(), self.manager.clone());
        let (undo_echo, redo_echo) = (self.echoes.clone(), self.echoes.clone());
        self.manager.record_undo(Box::new(
            CallbackObject::new("Write")
                .with_undo(move |_| {
                    if fail {
                        return Err(UndoError::TargetNotFound("cell".into()));
                    }
                    undo_cells.borrow_mut()[slot] = old;
                    undo_echo.set(undo_echo.get() + 1);
                    undo_mgr.record_undo(Box::new(CallbackObject::new("Echo")));
                    Ok(())
                })
                .with_redo(move || {
                    redo_cells.borrow_mut()[slot] = value;
                    redo_echo.set(redo_echo.get() + 1);
                    redo_mgr.record_undo(Box::new(CallbackObject::new("Echo")));
                    Ok(())
                }),
        ));
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let harness = Harness {
        manager: UndoManager::new(),
        cells: Rc::new(RefCell::new([0; 4])),
        echoes: Rc::new(Cell::new(0)),
    };
    let mgr = &harness.manager;

    for op in ops.iter().take(256) {
        let depth_before = (mgr.undo_depth(), mgr.redo_depth());
        match *op {
            Op::Begin => mgr.begin(),
            Op::Accept => mgr.accept("step"),
            Op::Cancel => {
                let _ = mgr.cancel();
            }
            Op::Restore(revert) => {
                let _ = mgr.restore(revert);
            }
            Op::SuperBegin => mgr.super_begin(),
            Op::SuperAccept => mgr.super_accept("macro"),
            Op::SuperCancel => {
                let _ = mgr.super_cancel();
            }
            Op::Record { slot, value, fail } => harness.record(slot, value, fail),
            Op::Undo(n) | Op::Redo(n) => {
                let open = mgr.is_transaction_open();
                let result = if matches!(op, Op::Undo(_)) {
                    mgr.undo(usize::from(n))
                } else {
                    mgr.redo(usize::from(n))
                };
                // Replay moves entries but never creates or destroys them.
                assert_eq!(
                    mgr.undo_depth() + mgr.redo_depth(),
                    depth_before.0 + depth_before.1
                );
                if open {
                    assert_eq!((mgr.undo_depth(), mgr.redo_depth()), depth_before);
                }
                let _ = result;
            }
            Op::Suspend => mgr.suspend(),
            Op::Resume => mgr.resume(),
            Op::ClearUndo(n) => mgr.clear_undo_stack(usize::from(n)),
            Op::ClearRedo(n) => mgr.clear_redo_stack(usize::from(n)),
            Op::Flush => mgr.flush(),
        }

        // Replay never leaves its flag behind.
        assert!(!matches!(
            mgr.state(),
            ManagerState::Undoing | ManagerState::Redoing
        ));
        if matches!(op, Op::Accept) && mgr.undo_depth() > depth_before.0 {
            assert_eq!(mgr.redo_depth(), 0);
        }
        let _ = mgr.undo_names(8);
        let _ = mgr.memory_usage();
    }
});
