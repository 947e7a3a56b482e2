#![forbid(unsafe_code)]

//! Atomic units of history.
//!
//! An [`UndoStep`] groups the objects recorded between one `begin` and its
//! `accept`. A [`SuperStep`] groups several steps recorded between
//! `super_begin` and `super_accept`. Both are undone as one unit:
//!
//! ```text
//! SuperStep "Align"            undo(): steps in reverse, each step's
//! ├── UndoStep "Move A"                 objects in reverse
//! │   ├── obj1                 redo(): steps forward, objects forward
//! │   └── obj2
//! └── UndoStep "Move B"
//!     └── obj3                 undo order: obj3, obj2, obj1
//! ```
//!
//! # Invariants
//!
//! 1. Insertion order is application order.
//! 2. A filed step is never empty and never changes again; the manager
//!    only moves it between stacks or drops it.
//! 3. The first failing child stops the walk and its error is returned.

use std::fmt;

use unicode_width::UnicodeWidthStr;

use crate::config::UndoConfig;
use crate::error::UndoResult;
use crate::object::UndoObject;

/// An ordered group of objects undone and redone as one unit.
#[derive(Default)]
pub struct UndoStep {
    name: String,
    objects: Vec<Box<dyn UndoObject>>,
    /// Descriptions of the coalescing objects already held.
    coalesce_keys: Vec<String>,
}

impl fmt::Debug for UndoStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoStep")
            .field("name", &self.name)
            .field("objects", &self.objects)
            .finish()
    }
}

impl UndoStep {
    /// Create an empty, unnamed step.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Step name, set when the step is accepted.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    /// Number of recorded objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Append an object.
    pub fn push(&mut self, obj: Box<dyn UndoObject>) {
        self.objects.push(obj);
    }

    /// Append an object that may coalesce with an earlier one.
    ///
    /// `key` is the object's description when the coalesce rule matched it.
    /// An object whose key is already held is handed back for dropping.
    pub(crate) fn push_keyed(
        &mut self,
        obj: Box<dyn UndoObject>,
        key: Option<String>,
    ) -> Result<(), Box<dyn UndoObject>> {
        if let Some(key) = key {
            if self.coalesce_keys.contains(&key) {
                return Err(obj);
            }
            self.coalesce_keys.push(key);
        }
        self.objects.push(obj);
        Ok(())
    }

    /// Reverse every object, last recorded first.
    pub fn undo(&mut self, user_initiated: bool) -> UndoResult {
        for obj in self.objects.iter_mut().rev() {
            obj.undo(user_initiated)?;
        }
        Ok(())
    }

    /// Replay every object in recording order.
    pub fn redo(&mut self) -> UndoResult {
        for obj in &mut self.objects {
            obj.redo()?;
        }
        Ok(())
    }

    /// Names of the touched objects, in recording order.
    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(|o| o.object_name())
    }

    /// `"<name> (<distinct object names>)"`, collapsed to the configured
    /// multiple-objects label when wider than `config.display_width`.
    #[must_use]
    pub fn display_name(&self, config: &UndoConfig) -> String {
        synthesize_display_name(&self.name, self.object_names(), config)
    }

    /// Approximate memory held by the step.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.name.len()
            + self.objects.iter().map(|o| o.size_bytes()).sum::<usize>()
    }

    /// Move the recorded objects out, leaving the step empty but keeping
    /// its name.
    pub(crate) fn take_objects(&mut self) -> UndoStep {
        UndoStep {
            name: self.name.clone(),
            objects: std::mem::take(&mut self.objects),
            coalesce_keys: std::mem::take(&mut self.coalesce_keys),
        }
    }
}

/// A group of steps undone and redone as one unit.
#[derive(Debug, Default)]
pub struct SuperStep {
    name: String,
    steps: Vec<UndoStep>,
}

impl SuperStep {
    /// Create an empty, unnamed super-step.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Super-step name, set when it is accepted.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    /// Number of nested steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True when no step was folded in.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Append an accepted step.
    pub fn push(&mut self, step: UndoStep) {
        self.steps.push(step);
    }

    /// Reverse every step, last recorded first.
    pub fn undo(&mut self, user_initiated: bool) -> UndoResult {
        for step in self.steps.iter_mut().rev() {
            step.undo(user_initiated)?;
        }
        Ok(())
    }

    /// Replay every step in recording order.
    pub fn redo(&mut self) -> UndoResult {
        for step in &mut self.steps {
            step.redo()?;
        }
        Ok(())
    }

    /// See [`UndoStep::display_name`]; object names are gathered across all
    /// nested steps.
    #[must_use]
    pub fn display_name(&self, config: &UndoConfig) -> String {
        synthesize_display_name(
            &self.name,
            self.steps.iter().flat_map(|step| step.object_names()),
            config,
        )
    }

    /// Approximate memory held by the super-step.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.name.len()
            + self.steps.iter().map(UndoStep::size_bytes).sum::<usize>()
    }
}

/// An element of the undo or redo stack.
#[derive(Debug)]
pub enum UndoEntry {
    Step(UndoStep),
    Super(SuperStep),
}

impl UndoEntry {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Step(step) => step.name(),
            Self::Super(sup) => sup.name(),
        }
    }

    #[must_use]
    pub fn display_name(&self, config: &UndoConfig) -> String {
        match self {
            Self::Step(step) => step.display_name(config),
            Self::Super(sup) => sup.display_name(config),
        }
    }

    pub fn undo(&mut self, user_initiated: bool) -> UndoResult {
        match self {
            Self::Step(step) => step.undo(user_initiated),
            Self::Super(sup) => sup.undo(user_initiated),
        }
    }

    pub fn redo(&mut self) -> UndoResult {
        match self {
            Self::Step(step) => step.redo(),
            Self::Super(sup) => sup.redo(),
        }
    }

    #[must_use]
    pub fn size_bytes(&self) -> usize {
        match self {
            Self::Step(step) => step.size_bytes(),
            Self::Super(sup) => sup.size_bytes(),
        }
    }

    #[must_use]
    pub fn is_super(&self) -> bool {
        matches!(self, Self::Super(_))
    }
}

fn synthesize_display_name<'a>(
    name: &str,
    object_names: impl Iterator<Item = &'a str>,
    config: &UndoConfig,
) -> String {
    let mut distinct: Vec<&str> = Vec::new();
    for object_name in object_names {
        if !object_name.is_empty() && !distinct.contains(&object_name) {
            distinct.push(object_name);
        }
    }
    if distinct.is_empty() {
        return name.to_owned();
    }

    let full = format!("{name} ({})", distinct.join(&config.name_separator));
    if full.width() > config.display_width {
        format!("{name} {}", config.multiple_objects_label)
    } else {
        full
    }
}

// ============================================================================
// Tests
// ============================================================================
