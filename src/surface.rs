//! Collaborator Contracts
//!
//! The engine never touches a rendered page. Inputs, decorations, the error
//! panel and the submit control are reached through these traits; the
//! in-memory implementations back tests, config assembly and the CLI.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::validators::FieldValue;

/// One value-bearing control on the page.
pub trait InputSurface {
    fn id(&self) -> &str;
    fn value(&self) -> String;
    fn set_value(&self, value: &str);
    fn is_checked(&self) -> bool;
    fn set_checked(&self, checked: bool);

    fn snapshot(&self) -> FieldValue {
        FieldValue { text: self.value(), checked: self.is_checked() }
    }
}

pub type SurfaceHandle = Rc<dyn InputSurface>;

/// Shared, single-threaded input state. Clones refer to the same control.
#[derive(Clone)]
pub struct MemoryInput {
    id: Rc<str>,
    state: Rc<RefCell<FieldValue>>,
}

impl MemoryInput {
    pub fn new(id: &str) -> Self {
        Self::with_value(id, FieldValue::default())
    }

    pub fn with_text(id: &str, text: &str) -> Self {
        Self::with_value(id, FieldValue::text(text))
    }

    pub fn with_checked(id: &str, checked: bool) -> Self {
        Self::with_value(id, FieldValue::checkbox(checked))
    }

    pub fn with_value(id: &str, value: FieldValue) -> Self {
        Self { id: Rc::from(id), state: Rc::new(RefCell::new(value)) }
    }

    pub fn handle(&self) -> SurfaceHandle {
        Rc::new(self.clone())
    }
}

impl InputSurface for MemoryInput {
    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self) -> String {
        self.state.borrow().text.clone()
    }

    fn set_value(&self, value: &str) {
        self.state.borrow_mut().text = value.to_string();
    }

    fn is_checked(&self) -> bool {
        self.state.borrow().checked
    }

    fn set_checked(&self, checked: bool) {
        self.state.borrow_mut().checked = checked;
    }
}

impl fmt::Debug for MemoryInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryInput")
            .field("id", &self.id)
            .field("value", &*self.state.borrow())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
    Valid,
    Invalid,
}

/// Two mutually exclusive presentation states per decoration target.
pub trait Decorator {
    fn mark_valid(&self, target: &str);
    fn mark_invalid(&self, target: &str);
    fn clear_mark(&self, target: &str);
}

pub struct NoDecoration;

impl Decorator for NoDecoration {
    fn mark_valid(&self, _target: &str) {}
    fn mark_invalid(&self, _target: &str) {}
    fn clear_mark(&self, _target: &str) {}
}

/// Records the current mark of every target it has seen.
#[derive(Debug, Default)]
pub struct MarkBoard {
    marks: RefCell<BTreeMap<String, Mark>>,
}

impl MarkBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_of(&self, target: &str) -> Option<Mark> {
        self.marks.borrow().get(target).copied()
    }

    pub fn marks(&self) -> BTreeMap<String, Mark> {
        self.marks.borrow().clone()
    }
}

impl Decorator for MarkBoard {
    fn mark_valid(&self, target: &str) {
        self.marks.borrow_mut().insert(target.to_string(), Mark::Valid);
    }

    fn mark_invalid(&self, target: &str) {
        self.marks.borrow_mut().insert(target.to_string(), Mark::Invalid);
    }

    fn clear_mark(&self, target: &str) {
        self.marks.borrow_mut().remove(target);
    }
}

/// Form-level error summary sink.
pub trait ErrorSurface {
    fn set_content(&self, html: &str);
    fn set_visible(&self, visible: bool);
}

#[derive(Debug, Default)]
pub struct ErrorPanel {
    content: RefCell<String>,
    visible: Cell<bool>,
}

impl ErrorPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> String {
        self.content.borrow().clone()
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }
}

impl ErrorSurface for ErrorPanel {
    fn set_content(&self, html: &str) {
        *self.content.borrow_mut() = html.to_string();
    }

    fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }
}

pub trait SubmitControl {
    fn set_disabled(&self, disabled: bool);
}

/// Remembers every enable/disable toggle, in order.
#[derive(Debug, Default)]
pub struct SubmitButton {
    disabled: Cell<bool>,
    history: RefCell<Vec<bool>>,
}

impl SubmitButton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.get()
    }

    pub fn history(&self) -> Vec<bool> {
        self.history.borrow().clone()
    }
}

impl SubmitControl for SubmitButton {
    fn set_disabled(&self, disabled: bool) {
        self.disabled.set(disabled);
        self.history.borrow_mut().push(disabled);
    }
}
