//! Contract Invariant Tests
//!
//! These tests verify the non-negotiable guarantees.

use std::cell::RefCell;
use std::rc::Rc;

use claimform_core::{
    form::SubmissionTarget, ErrorPanel, Field, FieldType, FormError, FormHandler, GateState, Group,
    InputSurface, Mark, MarkBoard, MemoryInput, Submission, SubmitButton, SubmitOutcome, ValidationStatus,
    DEFAULT_MESSAGE,
};

fn mailing_group(name: &MemoryInput, address: &MemoryInput) -> Group {
    Group::required("Mailing").with_fields([
        Field::bound(FieldType::Name, name.handle()),
        Field::bound(FieldType::Address, address.handle()),
    ])
}

#[derive(Clone, Default)]
struct Recorder {
    seen: Rc<RefCell<Vec<Submission>>>,
}

impl SubmissionTarget for Recorder {
    fn submit(&self, submission: &Submission) -> Result<(), FormError> {
        self.seen.borrow_mut().push(submission.clone());
        Ok(())
    }
}

#[test]
fn invariant_blank_required_gets_fallback_only() {
    let name = MemoryInput::new("Name");
    let address = MemoryInput::with_text("Address", "123 Main St");
    let marks = Rc::new(MarkBoard::new());
    let mut handler = FormHandler::new(vec![mailing_group(&name, &address)]).with_decorator(marks.clone());

    assert!(!handler.are_groups_valid());

    let group = handler.group("Mailing").unwrap();
    assert_eq!(group.fields()[0].status(), ValidationStatus::Blank);
    assert_eq!(group.fields()[1].status(), ValidationStatus::Valid);
    assert!(group.has_blank_inputs());
    assert_eq!(group.invalid_message(), None);

    // Blank contributes no per-field message, only the fallback.
    assert_eq!(handler.error_message(), DEFAULT_MESSAGE);
    assert_eq!(marks.mark_of("Name"), Some(Mark::Invalid));
    assert_eq!(marks.mark_of("Address"), Some(Mark::Valid));
}

#[test]
fn invariant_every_group_is_evaluated() {
    let bad_email = MemoryInput::with_text("Email", "not-an-email");
    let bad_claim = MemoryInput::with_text("Claim", "12345");
    let mut handler = FormHandler::new(vec![
        Group::required("Contact").with_field(
            Field::bound(FieldType::Email, bad_email.handle()).with_message("Enter a valid email."),
        ),
        Group::required("Claim").with_field(
            Field::bound(FieldType::ClaimNumber, bad_claim.handle()).with_message("Enter a valid claim number."),
        ),
    ]);

    assert!(!handler.are_groups_valid());
    assert_eq!(handler.error_message(), "Enter a valid email.<br/>Enter a valid claim number.");
}

#[test]
fn invariant_repeated_passes_are_stable() {
    let name = MemoryInput::with_text("Name", "J0");
    let address = MemoryInput::new("Address");
    let mut handler = FormHandler::new(vec![mailing_group(&name, &address)]);

    assert!(!handler.are_groups_valid());
    let first = handler.error_message();
    assert!(!handler.are_groups_valid());
    assert_eq!(handler.error_message(), first);
    assert!(first.starts_with("This field must only contain Alphabetical characters"));
    assert!(first.ends_with(DEFAULT_MESSAGE));
}

#[test]
fn invariant_unmet_conditional_is_skipped() {
    let foreign = MemoryInput::with_checked("Foreign", false);
    let country = MemoryInput::new("Country");
    let toggle = foreign.clone();
    let mut handler = FormHandler::new(vec![Group::required("Address").with_field(
        Field::bound(FieldType::General, country.handle()).conditional(move || toggle.is_checked()),
    )]);

    assert!(handler.are_groups_valid());
    assert_eq!(handler.groups()[0].fields()[0].status(), ValidationStatus::Valid);

    foreign.set_checked(true);
    assert!(!handler.are_groups_valid());
    assert_eq!(handler.groups()[0].fields()[0].status(), ValidationStatus::Blank);
}

#[test]
fn invariant_normalization_is_written_back() {
    let claim = MemoryInput::with_text("Claim", "  abc-123 ");
    let mut handler = FormHandler::new(vec![
        Group::required("Claim").with_field(Field::bound(FieldType::ClaimNumber, claim.handle())),
    ]);

    assert!(handler.are_groups_valid());
    assert_eq!(claim.value(), "ABC-123");
}

#[test]
fn invariant_blocked_submit_never_reaches_target() {
    let name = MemoryInput::new("Name");
    let address = MemoryInput::with_text("Address", "123 Main St");
    let recorder = Recorder::default();
    let panel = Rc::new(ErrorPanel::new());
    let button = Rc::new(SubmitButton::new());
    let mut handler = FormHandler::new(vec![mailing_group(&name, &address)])
        .with_error_surface(panel.clone())
        .with_submit_control(button.clone())
        .with_submission_target(Box::new(recorder.clone()));

    let outcome = handler.submit().unwrap();
    assert!(matches!(outcome, SubmitOutcome::Blocked { .. }));
    assert!(recorder.seen.borrow().is_empty());
    assert!(panel.is_visible());
    assert_eq!(panel.content(), DEFAULT_MESSAGE);
    assert!(!button.is_disabled());
    assert_eq!(handler.state(), GateState::Idle);

    // Fixing the input lets the next attempt through.
    name.set_value("Jo Doe");
    let outcome = handler.submit().unwrap();
    assert!(matches!(outcome, SubmitOutcome::Submitted(_)));
    assert_eq!(recorder.seen.borrow().len(), 1);
    assert_eq!(handler.state(), GateState::Submitting);
    assert!(button.is_disabled());
}

#[test]
fn invariant_submission_is_terminal() {
    let name = MemoryInput::with_text("Name", "Jo");
    let address = MemoryInput::with_text("Address", "1 Elm");
    let mut handler = FormHandler::new(vec![mailing_group(&name, &address)]);

    assert!(matches!(handler.submit().unwrap(), SubmitOutcome::Submitted(_)));
    let again = handler.submit().unwrap();
    assert!(matches!(again, SubmitOutcome::Ignored { state: GateState::Submitting }));
}

#[test]
fn invariant_submission_digest_stable() {
    let digest = || {
        let name = MemoryInput::with_text("Name", "Jo");
        let address = MemoryInput::with_text("Address", "1 Elm");
        let mut handler = FormHandler::new(vec![mailing_group(&name, &address)]);
        match handler.submit().unwrap() {
            SubmitOutcome::Submitted(submission) => submission,
            other => panic!("unexpected outcome: {:?}", other),
        }
    };

    let first = digest();
    let second = digest();
    assert_eq!(first.digest, second.digest);
    assert_ne!(first.id, second.id);
    assert_eq!(first.values.get("Name").map(String::as_str), Some("Jo"));
}
