//! Form Handler - Group Orchestration and the Submission Gate
//!
//! CRITICAL: `submit` is the only path to the submission target, and it
//! always runs `are_groups_valid` first.

use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::report;
use crate::disbursement::DigitalDisbursement;
use crate::error::{ConfigError, FormError};
use crate::events::EventKind;
use crate::field::Tier;
use crate::group::{Group, MESSAGE_SEPARATOR};
use crate::hashing::compute_submission_digest;
use crate::surface::{Decorator, ErrorSurface, NoDecoration, SubmitControl};
use crate::validators::{FieldType, ValidationStatus};

pub const DEFAULT_MESSAGE: &str = "Please complete the required fields in order to continue.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Idle,
    Validating,
    Blocked,
    /// Terminal: the form has been handed to the submission target.
    Submitting,
}

/// What the host form-submission mechanism receives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub submitted_at: DateTime<Utc>,
    pub values: BTreeMap<String, String>,
    pub digest: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Submitted(Submission),
    Blocked { summary: String },
    /// The gate was not idle; nothing happened.
    Ignored { state: GateState },
}

pub trait SubmissionTarget {
    fn submit(&self, submission: &Submission) -> Result<(), FormError>;
}

/// Per-field status after a pass, for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldReport {
    pub group: String,
    pub field: String,
    pub field_type: FieldType,
    pub tier: Tier,
    pub status: ValidationStatus,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub struct FormHandler {
    groups: Vec<Group>,
    disbursement: Option<DigitalDisbursement>,
    default_message: String,
    errors: Vec<String>,
    decorator: Rc<dyn Decorator>,
    error_surface: Option<Rc<dyn ErrorSurface>>,
    submit_control: Option<Rc<dyn SubmitControl>>,
    target: Option<Box<dyn SubmissionTarget>>,
    state: GateState,
}

impl FormHandler {
    pub fn new(groups: Vec<Group>) -> Self {
        Self {
            groups,
            disbursement: None,
            default_message: DEFAULT_MESSAGE.to_string(),
            errors: vec![],
            decorator: Rc::new(NoDecoration),
            error_surface: None,
            submit_control: None,
            target: None,
            state: GateState::Idle,
        }
    }

    pub fn with_default_message(mut self, message: impl Into<String>) -> Self {
        self.default_message = message.into();
        self
    }

    pub fn with_disbursement(mut self, disbursement: DigitalDisbursement) -> Self {
        self.disbursement = Some(disbursement);
        self
    }

    pub fn with_decorator(mut self, decorator: Rc<dyn Decorator>) -> Self {
        self.decorator = decorator;
        self
    }

    pub fn with_error_surface(mut self, surface: Rc<dyn ErrorSurface>) -> Self {
        self.error_surface = Some(surface);
        self
    }

    pub fn with_submit_control(mut self, control: Rc<dyn SubmitControl>) -> Self {
        self.submit_control = Some(control);
        self
    }

    pub fn with_submission_target(mut self, target: Box<dyn SubmissionTarget>) -> Self {
        self.target = Some(target);
        self
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name() == name)
    }

    pub fn disbursement(&self) -> Option<&DigitalDisbursement> {
        self.disbursement.as_ref()
    }

    pub fn default_message(&self) -> &str {
        &self.default_message
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Appends to the summary, skipping exact repeats.
    pub fn add_error_message(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !message.is_empty() && !self.errors.contains(&message) {
            self.errors.push(message);
        }
    }

    pub fn error_message(&self) -> String {
        self.errors.join(MESSAGE_SEPARATOR)
    }

    /// Writes the summary to the error surface, unhides it, and resets the buffer.
    pub fn show_error_message(&mut self) {
        if let Some(surface) = &self.error_surface {
            surface.set_content(&self.error_message());
            surface.set_visible(true);
            self.errors.clear();
        }
    }

    pub fn clear_error_message(&mut self) {
        if let Some(surface) = &self.error_surface {
            surface.set_content("");
            surface.set_visible(false);
        }
        self.errors.clear();
    }

    /// Validates every applicable group without short-circuiting and
    /// collects their messages into the form summary.
    pub fn are_groups_valid(&mut self) -> bool {
        self.errors.clear();

        let mut is_valid = true;
        let mut show_default_message = false;
        let mut default_message_override = false;
        let mut collected = vec![];

        if let Some(message) = self.disbursement.as_ref().and_then(|dd| dd.check()) {
            is_valid = false;
            collected.push(message.to_string());
        }

        let decorator = Rc::clone(&self.decorator);
        for group in &mut self.groups {
            if !group.applies() {
                debug!(group = %group.name(), "condition not met, skipping");
                continue;
            }
            if group.validate(decorator.as_ref()) {
                continue;
            }

            is_valid = false;
            show_default_message |= group.has_blank_inputs();
            default_message_override |= group.overrides_default_message();
            if let Some(message) = group.take_validation_message() {
                collected.push(message);
            }
        }

        for message in collected {
            self.add_error_message(message);
        }
        if !is_valid && show_default_message && !default_message_override {
            let fallback = self.default_message.clone();
            self.add_error_message(fallback);
        }

        is_valid
    }

    /// Runs the submission gate once.
    pub fn submit(&mut self) -> Result<SubmitOutcome, FormError> {
        if self.state != GateState::Idle {
            warn!(state = ?self.state, "submit ignored");
            return Ok(SubmitOutcome::Ignored { state: self.state });
        }

        self.state = GateState::Validating;
        self.set_submit_disabled(true);
        self.clear_error_message();

        if self.are_groups_valid() {
            self.state = GateState::Submitting;
            let submission = self.build_submission()?;
            if let Some(target) = &self.target {
                if let Err(e) = target.submit(&submission) {
                    self.state = GateState::Idle;
                    self.set_submit_disabled(false);
                    return Err(e);
                }
            }
            info!(id = %submission.id, digest = %submission.digest, "form submitted");
            return Ok(SubmitOutcome::Submitted(submission));
        }

        self.state = GateState::Blocked;
        let summary = self.error_message();
        self.set_submit_disabled(false);
        self.show_error_message();
        info!(errors = %summary, "submission blocked");
        self.state = GateState::Idle;
        Ok(SubmitOutcome::Blocked { summary })
    }

    fn set_submit_disabled(&self, disabled: bool) {
        if let Some(control) = &self.submit_control {
            control.set_disabled(disabled);
        }
    }

    fn build_submission(&self) -> Result<Submission, FormError> {
        let values = self.values();
        let digest = compute_submission_digest(&values)?;
        Ok(Submission {
            id: Uuid::new_v4().to_string(),
            submitted_at: Utc::now(),
            values,
            digest,
        })
    }

    /// Current value of every bound field and payment slot, keyed by input id.
    pub fn values(&self) -> BTreeMap<String, String> {
        let mut values = BTreeMap::new();
        for field in self.groups.iter().flat_map(|g| g.fields()) {
            let Some(input) = field.input() else { continue };
            let value = match field.field_type() {
                FieldType::Checkbox => input.is_checked().to_string(),
                _ => input.value(),
            };
            values.insert(input.id().to_string(), value);
        }
        if let Some(dd) = &self.disbursement {
            for slot in [dd.payment_id(), dd.payment_method()].into_iter().flatten() {
                values.insert(slot.id().to_string(), slot.value());
            }
        }
        values
    }

    /// Setup problems in how fields and payment slots are wired.
    pub fn wiring_diagnostics(&self) -> Vec<ConfigError> {
        let mut problems = vec![];
        for field in self.groups.iter().flat_map(|g| g.fields()) {
            if !field.events().is_empty() && field.input().is_none() {
                report(&mut problems, ConfigError::MissingEventSurface(field.name().to_string()));
            }
        }
        if let Some(dd) = &self.disbursement {
            for problem in dd.diagnostics() {
                report(&mut problems, problem);
            }
        }
        problems
    }

    /// Fires `kind` on every field bound to `input`. Returns how many fired.
    pub fn dispatch(&self, input: &str, kind: EventKind) -> usize {
        self.groups
            .iter()
            .flat_map(|g| g.fields())
            .filter(|f| f.input().is_some_and(|i| i.id() == input))
            .filter(|f| f.fire(kind, self.decorator.as_ref()))
            .count()
    }

    pub fn field_reports(&self) -> Vec<FieldReport> {
        let mut reports = vec![];
        for group in &self.groups {
            for field in group.fields() {
                reports.push(FieldReport {
                    group: group.name().to_string(),
                    field: field.name().to_string(),
                    field_type: field.field_type(),
                    tier: field.tier(),
                    status: field.status(),
                    value: field.snapshot().text,
                    message: field.message().map(str::to_owned),
                });
            }
        }
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disbursement::PaymentInfo;
    use crate::field::Field;
    use crate::surface::{ErrorPanel, InputSurface, MemoryInput, SubmitButton};
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        seen: Rc<RefCell<Vec<Submission>>>,
    }

    impl SubmissionTarget for Recorder {
        fn submit(&self, submission: &Submission) -> Result<(), FormError> {
            self.seen.borrow_mut().push(submission.clone());
            Ok(())
        }
    }

    fn contact_group(first: &MemoryInput) -> Group {
        Group::required("contact").with_field(
            Field::bound(FieldType::Name, first.handle()).with_display_name("First Name"),
        )
    }

    #[test]
    fn test_blank_required_adds_fallback_message() {
        let first = MemoryInput::new("FirstName");
        let mut handler = FormHandler::new(vec![contact_group(&first)]);

        assert!(!handler.are_groups_valid());
        assert_eq!(handler.error_message(), DEFAULT_MESSAGE);
    }

    #[test]
    fn test_override_suppresses_fallback() {
        let first = MemoryInput::new("FirstName");
        let group = contact_group(&first)
            .with_invalid_message("Tell us who you are.")
            .with_default_message_override();
        let mut handler = FormHandler::new(vec![group]);

        assert!(!handler.are_groups_valid());
        assert_eq!(handler.error_message(), "Tell us who you are.");
    }

    #[test]
    fn test_all_groups_evaluated_and_messages_migrate() {
        let first = MemoryInput::with_text("FirstName", "J0");
        let zip = MemoryInput::with_text("Zip", "123");
        let zip_group = Group::required("address")
            .with_field(Field::bound(FieldType::Zip, zip.handle()).with_message("Zip code is not valid."));
        let mut handler = FormHandler::new(vec![contact_group(&first), zip_group]);

        assert!(!handler.are_groups_valid());
        assert_eq!(
            handler.error_message(),
            "First Name must only contain Alphabetical characters, hyphens, or apostrophes.<br/>Zip code is not valid."
        );
        assert!(handler.groups().iter().all(|g| g.invalid_message().is_none()));
    }

    #[test]
    fn test_closed_conditional_group_skipped() {
        let first = MemoryInput::new("FirstName");
        let group = Group::conditional("claimant", || false)
            .with_field(Field::bound(FieldType::Name, first.handle()));
        let mut handler = FormHandler::new(vec![group]);
        assert!(handler.are_groups_valid());
        assert_eq!(handler.error_message(), "");
    }

    #[test]
    fn test_duplicate_messages_collapse() {
        let mut handler = FormHandler::new(vec![]);
        handler.add_error_message("same");
        handler.add_error_message("same");
        handler.add_error_message("other");
        assert_eq!(handler.error_message(), "same<br/>other");
    }

    #[test]
    fn test_disbursement_checked_before_groups() {
        let pid = MemoryInput::new("PaymentId");
        let method = MemoryInput::new("PaymentMethod");
        let first = MemoryInput::with_text("FirstName", "Jo");
        let dd = DigitalDisbursement::new("live")
            .with_payment_id(pid.handle())
            .with_payment_method(method.handle())
            .with_message("Payment details are required.");
        let mut handler = FormHandler::new(vec![contact_group(&first)]).with_disbursement(dd);

        assert!(!handler.are_groups_valid());
        assert_eq!(handler.error_message(), "Payment details are required.");

        handler
            .disbursement()
            .unwrap()
            .on_submitted(&PaymentInfo { token: "tok".into(), method: "card".into() });
        assert!(handler.are_groups_valid());
    }

    #[test]
    fn test_blocked_submission_returns_to_idle() {
        let first = MemoryInput::new("FirstName");
        let panel = Rc::new(ErrorPanel::new());
        let button = Rc::new(SubmitButton::new());
        let mut handler = FormHandler::new(vec![contact_group(&first)])
            .with_error_surface(panel.clone())
            .with_submit_control(button.clone());

        let outcome = handler.submit().unwrap();
        assert!(matches!(outcome, SubmitOutcome::Blocked { ref summary } if summary == DEFAULT_MESSAGE));
        assert_eq!(handler.state(), GateState::Idle);
        assert!(panel.is_visible());
        assert_eq!(panel.content(), DEFAULT_MESSAGE);
        assert_eq!(button.history(), vec![true, false]);
        assert_eq!(handler.error_message(), "");
    }

    #[test]
    fn test_successful_submission_is_terminal() {
        let first = MemoryInput::with_text("FirstName", " Jo ");
        let panel = Rc::new(ErrorPanel::new());
        let recorder = Recorder::default();
        let seen = Rc::clone(&recorder.seen);
        let mut handler = FormHandler::new(vec![contact_group(&first)])
            .with_error_surface(panel.clone())
            .with_submission_target(Box::new(recorder));

        match handler.submit().unwrap() {
            SubmitOutcome::Submitted(submission) => {
                assert_eq!(submission.values.get("FirstName").map(String::as_str), Some("Jo"));
                assert_eq!(submission.digest.len(), 64);
            }
            other => panic!("expected submission, got {:?}", other),
        }
        assert_eq!(handler.state(), GateState::Submitting);
        assert!(!panel.is_visible());
        assert_eq!(seen.borrow().len(), 1);

        assert!(matches!(handler.submit().unwrap(), SubmitOutcome::Ignored { .. }));
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_dispatch_reaches_every_binding() {
        let street = MemoryInput::with_text("StreetAddress", "1 Main");
        let upper = |ctx: &crate::events::EventContext<'_>| {
            ctx.input.set_value(&ctx.input.value().to_uppercase());
        };
        let a = Group::required("a")
            .with_field(Field::bound(FieldType::Address, street.handle()).on(EventKind::Blur, upper));
        let b = Group::required("b")
            .with_field(Field::bound(FieldType::Address, street.handle()).optional());
        let handler = FormHandler::new(vec![a, b]);

        assert_eq!(handler.dispatch("StreetAddress", EventKind::Blur), 1);
        assert_eq!(street.value(), "1 MAIN");
        assert_eq!(handler.dispatch("StreetAddress", EventKind::Click), 0);
    }
}
