//! Input Groups - Tiered Validation
//!
//! A group scans its fields in tier order (required, conditional, optional)
//! and collects every failure; nothing short-circuits.

use std::fmt;
use std::rc::Rc;

use chrono::{Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::field::{Field, Predicate, Tier};
use crate::surface::{Decorator, SurfaceHandle};
use crate::validators::{parse_date, ValidationStatus};

/// Joins accumulated messages in both the group and form buffers.
pub const MESSAGE_SEPARATOR: &str = "<br/>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationType {
    Required,
    Conditional,
}

#[derive(Clone)]
pub enum GroupKind {
    Required,
    /// Validated only while the predicate holds.
    Conditional(Predicate),
}

impl GroupKind {
    pub fn validation_type(&self) -> ValidationType {
        match self {
            GroupKind::Required => ValidationType::Required,
            GroupKind::Conditional(_) => ValidationType::Conditional,
        }
    }
}

/// Replaces the default tier scan. Must leave the group's validity flag
/// consistent with its return value.
pub type GroupValidation = Rc<dyn Fn(&mut Group, &dyn Decorator) -> bool>;

pub struct Group {
    name: String,
    kind: GroupKind,
    fields: Vec<Field>,
    custom: Option<GroupValidation>,
    invalid_message: Option<String>,
    messages: Vec<String>,
    is_valid: bool,
    has_blank_inputs: bool,
    override_default_message: bool,
}

impl Group {
    pub fn new(name: impl Into<String>, kind: GroupKind) -> Self {
        Self {
            name: name.into(),
            kind,
            fields: vec![],
            custom: None,
            invalid_message: None,
            messages: vec![],
            is_valid: true,
            has_blank_inputs: false,
            override_default_message: false,
        }
    }

    pub fn required(name: impl Into<String>) -> Self {
        Self::new(name, GroupKind::Required)
    }

    pub fn conditional(name: impl Into<String>, condition: impl Fn() -> bool + 'static) -> Self {
        Self::new(name, GroupKind::Conditional(Rc::new(condition)))
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Leads the group's buffer whenever a pass fails.
    pub fn with_invalid_message(mut self, message: impl Into<String>) -> Self {
        self.invalid_message = Some(message.into());
        self
    }

    /// Suppress the form's fallback message when this group has blanks.
    pub fn with_default_message_override(mut self) -> Self {
        self.override_default_message = true;
        self
    }

    pub fn with_custom_validation(
        mut self,
        validation: impl Fn(&mut Group, &dyn Decorator) -> bool + 'static,
    ) -> Self {
        self.custom = Some(Rc::new(validation));
        self
    }

    pub fn with_group_validation(mut self, validation: GroupValidation) -> Self {
        self.custom = Some(validation);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &GroupKind {
        &self.kind
    }

    pub fn validation_type(&self) -> ValidationType {
        self.kind.validation_type()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut [Field] {
        &mut self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &Field> {
        self.in_tier(Tier::Required)
    }

    pub fn conditional_fields(&self) -> impl Iterator<Item = &Field> {
        self.in_tier(Tier::Conditional)
    }

    pub fn optional_fields(&self) -> impl Iterator<Item = &Field> {
        self.in_tier(Tier::Optional)
    }

    fn in_tier(&self, tier: Tier) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(move |f| f.tier() == tier)
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn set_valid(&mut self, valid: bool) {
        self.is_valid = valid;
    }

    pub fn has_blank_inputs(&self) -> bool {
        self.has_blank_inputs
    }

    pub fn overrides_default_message(&self) -> bool {
        self.override_default_message
    }

    pub fn has_custom_validation(&self) -> bool {
        self.custom.is_some()
    }

    /// Whether the group imposes any validation burden right now.
    pub fn applies(&self) -> bool {
        match &self.kind {
            GroupKind::Required => true,
            GroupKind::Conditional(condition) => condition(),
        }
    }

    pub fn add_validation_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn clear_validation_message(&mut self) {
        self.messages.clear();
    }

    /// The accumulated buffer, or None when empty.
    pub fn invalid_message(&self) -> Option<String> {
        if self.messages.is_empty() {
            None
        } else {
            Some(self.messages.join(MESSAGE_SEPARATOR))
        }
    }

    /// Hands the buffer upward and leaves it empty.
    pub fn take_validation_message(&mut self) -> Option<String> {
        let message = self.invalid_message();
        self.clear_validation_message();
        message
    }

    /// Resets per-pass state, then runs the custom validation if one is
    /// configured and the default tier scan otherwise.
    pub fn validate(&mut self, decorator: &dyn Decorator) -> bool {
        self.is_valid = true;
        self.has_blank_inputs = false;
        self.clear_validation_message();

        let valid = match self.custom.clone() {
            Some(custom) => custom(self, decorator),
            None => self.default_validation(decorator),
        };

        if !valid {
            if let Some(message) = &self.invalid_message {
                self.messages.insert(0, message.clone());
            }
        }

        debug!(
            group = %self.name,
            valid,
            has_blank_inputs = self.has_blank_inputs,
            "group validated"
        );
        valid
    }

    pub fn default_validation(&mut self, decorator: &dyn Decorator) -> bool {
        if !self.applies() {
            return self.is_valid;
        }

        for tier in Tier::SCAN_ORDER {
            for idx in 0..self.fields.len() {
                if self.fields[idx].tier() != tier {
                    continue;
                }
                self.scan_field(idx, decorator);
            }
        }

        self.is_valid
    }

    fn scan_field(&mut self, idx: usize, decorator: &dyn Decorator) {
        let field = &mut self.fields[idx];
        field.clear_validation(decorator);

        // Blank only counts when the field was actually required.
        let required = field.requirement_met();
        if !required && !field.has_value() {
            return;
        }
        if field.validate(decorator) {
            return;
        }

        let status = field.status();
        let message = field.message().map(str::to_owned);
        self.is_valid = false;
        match status {
            ValidationStatus::Blank if required => self.has_blank_inputs = true,
            ValidationStatus::Invalid => {
                if let Some(message) = message {
                    self.add_validation_message(message);
                }
            }
            _ => {}
        }
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name)
            .field("validation_type", &self.validation_type())
            .field("fields", &self.fields)
            .field("custom", &self.custom.is_some())
            .field("is_valid", &self.is_valid)
            .field("has_blank_inputs", &self.has_blank_inputs)
            .field("messages", &self.messages)
            .finish()
    }
}

/// Custom group validation requiring the date in `input` to be at least
/// `years` before today. Decorates `input` directly.
pub fn minimum_age(input: SurfaceHandle, years: u32) -> GroupValidation {
    Rc::new(move |group: &mut Group, decorator: &dyn Decorator| {
        let today = Local::now().date_naive();
        let old_enough = is_at_least(&input.value(), years, today);
        if old_enough {
            decorator.clear_mark(input.id());
        } else {
            group.set_valid(false);
            decorator.mark_invalid(input.id());
        }
        group.is_valid()
    })
}

fn is_at_least(value: &str, years: u32, today: NaiveDate) -> bool {
    let Some(born) = parse_date(value) else {
        return false;
    };
    match today.checked_sub_months(Months::new(years.saturating_mul(12))) {
        Some(latest) => born <= latest,
        None => false,
    }
}
