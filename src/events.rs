//! Field Event Wiring
//!
//! Callbacks capture whatever they need explicitly; the engine hands them the
//! field's input surface and the decorator at dispatch time.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::surface::{Decorator, InputSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Input,
    Blur,
    Click,
    Change,
}

pub struct EventContext<'a> {
    pub field: &'a str,
    pub input: &'a dyn InputSurface,
    pub decorator: &'a dyn Decorator,
    /// Where decorations for this field land.
    pub target: &'a str,
}

pub type EventCallback = Rc<dyn Fn(&EventContext<'_>)>;

#[derive(Clone, Default)]
pub struct FieldEvents {
    handlers: HashMap<EventKind, EventCallback>,
}

impl FieldEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `callback` to `kind`, replacing any earlier binding.
    pub fn bind(&mut self, kind: EventKind, callback: EventCallback) {
        self.handlers.insert(kind, callback);
    }

    pub fn get(&self, kind: EventKind) -> Option<&EventCallback> {
        self.handlers.get(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        let mut kinds: Vec<_> = self.handlers.keys().copied().collect();
        kinds.sort_by_key(|k| *k as u8);
        kinds
    }
}

impl fmt::Debug for FieldEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldEvents").field("kinds", &self.kinds()).finish()
    }
}
