//! Field - One Form Control Under Validation

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::events::{EventCallback, EventContext, EventKind, FieldEvents};
use crate::surface::{Decorator, SurfaceHandle};
use crate::validators::{
    FieldType, FieldValue, ValidationMode, ValidationStatus, Verdict, FIELD_PLACEHOLDER,
};

/// Requirement condition evaluated against live page state.
pub type Predicate = Rc<dyn Fn() -> bool>;

/// Caller-supplied replacement for a type's default validator.
pub type CustomValidator = Rc<dyn Fn(&mut FieldValue, ValidationMode) -> Verdict>;

/// Which tier of its group a field is scanned in.
#[derive(Clone)]
pub enum FieldRole {
    Required,
    /// Required only while the predicate holds; otherwise checked if filled.
    Conditional(Predicate),
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Required,
    Conditional,
    Optional,
}

impl Tier {
    pub const SCAN_ORDER: [Tier; 3] = [Tier::Required, Tier::Conditional, Tier::Optional];
}

impl FieldRole {
    pub fn tier(&self) -> Tier {
        match self {
            FieldRole::Required => Tier::Required,
            FieldRole::Conditional(_) => Tier::Conditional,
            FieldRole::Optional => Tier::Optional,
        }
    }
}

impl fmt::Debug for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldRole::Required => "Required",
            FieldRole::Conditional(_) => "Conditional(..)",
            FieldRole::Optional => "Optional",
        })
    }
}

#[derive(Clone)]
enum FieldValidator {
    Default(fn(&mut FieldValue, ValidationMode) -> Verdict),
    Custom(CustomValidator),
}

impl FieldValidator {
    fn run(&self, value: &mut FieldValue, mode: ValidationMode) -> Verdict {
        match self {
            FieldValidator::Default(f) => f(value, mode),
            FieldValidator::Custom(f) => f(value, mode),
        }
    }
}

pub struct Field {
    name: String,
    field_type: FieldType,
    mode: ValidationMode,
    display_name: Option<String>,
    message_override: Option<String>,
    role: FieldRole,
    input: Option<SurfaceHandle>,
    decoration_target: Option<String>,
    validator: FieldValidator,
    events: FieldEvents,
    status: ValidationStatus,
    message: Option<String>,
}

impl Field {
    /// A required field of `field_type` with the type's default mode and validator.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            mode: field_type.default_mode(),
            display_name: None,
            message_override: None,
            role: FieldRole::Required,
            input: None,
            decoration_target: None,
            validator: FieldValidator::Default(field_type.default_validator()),
            events: FieldEvents::new(),
            status: ValidationStatus::Valid,
            message: None,
        }
    }

    /// Shorthand for a field named after its input surface.
    pub fn bound(field_type: FieldType, input: SurfaceHandle) -> Self {
        Self::new(input.id().to_string(), field_type).with_input(input)
    }

    pub fn with_input(mut self, input: SurfaceHandle) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message_override = Some(message.into());
        self
    }

    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_role(mut self, role: FieldRole) -> Self {
        self.role = role;
        self
    }

    pub fn conditional(self, predicate: impl Fn() -> bool + 'static) -> Self {
        self.with_role(FieldRole::Conditional(Rc::new(predicate)))
    }

    pub fn optional(self) -> Self {
        self.with_role(FieldRole::Optional)
    }

    pub fn with_decoration_target(mut self, target: impl Into<String>) -> Self {
        self.decoration_target = Some(target.into());
        self
    }

    pub fn with_validator(
        mut self,
        validator: impl Fn(&mut FieldValue, ValidationMode) -> Verdict + 'static,
    ) -> Self {
        self.validator = FieldValidator::Custom(Rc::new(validator));
        self
    }

    pub fn on(mut self, kind: EventKind, callback: impl Fn(&EventContext<'_>) + 'static) -> Self {
        self.events.bind(kind, Rc::new(callback) as EventCallback);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn role(&self) -> &FieldRole {
        &self.role
    }

    pub fn tier(&self) -> Tier {
        self.role.tier()
    }

    pub fn status(&self) -> ValidationStatus {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn input(&self) -> Option<&SurfaceHandle> {
        self.input.as_ref()
    }

    pub fn events(&self) -> &FieldEvents {
        &self.events
    }

    /// The error-styling target: explicit target, else the input itself.
    pub fn decoration_target(&self) -> &str {
        match (&self.decoration_target, &self.input) {
            (Some(target), _) => target.as_str(),
            (None, Some(input)) => input.id(),
            (None, None) => &self.name,
        }
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("This field")
    }

    /// Current value; an unbound field reads as empty.
    pub fn snapshot(&self) -> FieldValue {
        self.input.as_ref().map(|i| i.snapshot()).unwrap_or_default()
    }

    /// Whether the field holds something worth format-checking.
    pub fn has_value(&self) -> bool {
        let value = self.snapshot();
        match self.field_type {
            FieldType::Checkbox => value.checked,
            _ => !value.is_blank(),
        }
    }

    /// Evaluates the resolved requirement of a conditional field.
    /// Required fields always return true, optional fields never do.
    pub fn requirement_met(&self) -> bool {
        match &self.role {
            FieldRole::Required => true,
            FieldRole::Conditional(predicate) => predicate(),
            FieldRole::Optional => false,
        }
    }

    pub fn clear_validation(&self, decorator: &dyn Decorator) {
        decorator.clear_mark(self.decoration_target());
    }

    /// Runs the resolved validator, persists the normalized value, updates
    /// status and message, and decorates the field. Returns true when valid.
    pub fn validate(&mut self, decorator: &dyn Decorator) -> bool {
        self.clear_validation(decorator);

        let Some(input) = self.input.clone() else {
            error!(field = %self.name, "cannot validate an input without a bound surface");
            self.status = ValidationStatus::Invalid;
            self.message = self.message_override.clone();
            return false;
        };

        let mut value = input.snapshot();
        let before = value.text.clone();
        let verdict = self.validator.run(&mut value, self.mode);
        if value.text != before {
            input.set_value(&value.text);
        }

        self.status = verdict.status;
        self.message = match verdict.status {
            ValidationStatus::Valid => None,
            _ => self
                .message_override
                .clone()
                .or_else(|| verdict.message.map(|m| m.replace(FIELD_PLACEHOLDER, self.display_name()))),
        };

        match verdict.status {
            ValidationStatus::Valid => decorator.mark_valid(self.decoration_target()),
            _ => decorator.mark_invalid(self.decoration_target()),
        }

        self.status == ValidationStatus::Valid
    }

    /// Invokes the handler bound to `kind`. Returns false if nothing fired.
    pub fn fire(&self, kind: EventKind, decorator: &dyn Decorator) -> bool {
        let (Some(callback), Some(input)) = (self.events.get(kind), self.input.as_ref()) else {
            return false;
        };
        let ctx = EventContext {
            field: &self.name,
            input: &**input,
            decorator,
            target: self.decoration_target(),
        };
        callback(&ctx);
        true
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("mode", &self.mode)
            .field("role", &self.role)
            .field("bound", &self.input.is_some())
            .field("status", &self.status)
            .field("message", &self.message)
            .finish()
    }
}
