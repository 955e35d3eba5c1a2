//! Form description tests: JSON in, assembled handler out.

use std::fs;
use std::rc::Rc;

use claimform_core::{
    ConfigError, EventKind, FormConfig, InputRegistry, InputSurface, Mark, MarkBoard, ValidationStatus,
    DEFAULT_MESSAGE,
};
use tempfile::TempDir;

const CLAIM_FORM: &str = r#"{
    "name": "unclaimed-property",
    "engineMinVersion": "1.0.0",
    "groups": [
        {
            "name": "Claimant",
            "validationType": "required",
            "invalidMessage": "Please review the claimant section.",
            "requiredInputs": [
                { "input": "FirstName", "inputType": "name", "displayName": "First name" },
                { "input": "ClaimNumber", "inputType": "claim_number" }
            ],
            "conditionalInputs": [
                {
                    "input": "Country",
                    "inputType": "general",
                    "condition": { "when": "checked", "input": "ForeignAddress" }
                }
            ],
            "optionalInputs": [
                { "input": "Phone", "inputType": "phone", "message": "Enter a 10 digit phone number." }
            ]
        },
        {
            "name": "Agreement",
            "validationType": "conditional",
            "condition": { "when": "filled", "input": "ClaimNumber" },
            "overrideDefaultHandlerMessage": true,
            "requiredInputs": [
                { "input": "Agree", "inputType": "checkbox", "errorNode": "AgreeLabel" }
            ]
        }
    ]
}"#;

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_assemble_from_files() {
    let dir = TempDir::new().unwrap();
    let config = FormConfig::from_file(&write(&dir, "form.json", CLAIM_FORM)).unwrap();
    let page = InputRegistry::from_file(&write(
        &dir,
        "page.json",
        r#"{"FirstName": "Jo", "ClaimNumber": "abc-42", "ForeignAddress": false,
            "Country": "", "Phone": "", "Agree": true}"#,
    ))
    .unwrap();

    let assembly = config.assemble(&page).unwrap();
    assert!(assembly.diagnostics.is_empty());

    let mut handler = assembly.handler;
    assert!(handler.are_groups_valid());
    assert_eq!(page.get("ClaimNumber").unwrap().value(), "ABC-42");
}

#[test]
fn test_invalid_message_leads_group_summary() {
    let config = FormConfig::from_json(CLAIM_FORM).unwrap();
    let page = InputRegistry::from_json(
        r#"{"FirstName": "Jo", "ClaimNumber": "ABC-1", "ForeignAddress": false,
            "Country": "", "Phone": "555", "Agree": true}"#,
    )
    .unwrap();

    let mut handler = config.assemble(&page).unwrap().handler;
    assert!(!handler.are_groups_valid());
    assert_eq!(
        handler.error_message(),
        "Please review the claimant section.<br/>Enter a 10 digit phone number."
    );
}

#[test]
fn test_conditional_group_and_override() {
    let config = FormConfig::from_json(CLAIM_FORM).unwrap();
    let page = InputRegistry::from_json(
        r#"{"FirstName": "Jo", "ClaimNumber": "ABC-1", "ForeignAddress": false,
            "Country": "", "Phone": "", "Agree": false}"#,
    )
    .unwrap();

    let marks = Rc::new(MarkBoard::new());
    let mut handler = config.assemble(&page).unwrap().handler.with_decorator(marks.clone());
    assert!(!handler.are_groups_valid());

    // An unchecked box fails without a message of its own.
    assert_eq!(handler.error_message(), "");
    assert_eq!(marks.mark_of("AgreeLabel"), Some(Mark::Invalid));

    // Without a claim number the agreement group does not apply at all, but
    // the blank claim number itself brings the fallback back.
    page.get("ClaimNumber").unwrap().set_value("");
    assert!(!handler.are_groups_valid());
    assert_eq!(
        handler.error_message(),
        format!("Please review the claimant section.<br/>{}", DEFAULT_MESSAGE)
    );
}

#[test]
fn test_foreign_address_requires_country() {
    let config = FormConfig::from_json(CLAIM_FORM).unwrap();
    let page = InputRegistry::from_json(
        r#"{"FirstName": "Jo", "ClaimNumber": "ABC-1", "ForeignAddress": true,
            "Country": "", "Phone": "", "Agree": true}"#,
    )
    .unwrap();

    let mut handler = config.assemble(&page).unwrap().handler;
    assert!(!handler.are_groups_valid());
    let claimant = handler.group("Claimant").unwrap();
    assert_eq!(claimant.field("Country").unwrap().status(), ValidationStatus::Blank);
}

#[test]
fn test_wiring_problems_are_diagnostics() {
    let config = FormConfig::from_json(
        r#"{
            "groups": [
                {
                    "validationType": "conditional",
                    "requiredInputs": [{ "input": "Ghost", "inputType": "general" }],
                    "conditionalInputs": [{ "input": "Maybe", "inputType": "general" }]
                }
            ],
            "digitalDisbursements": { "widgetKey": "temp", "paymentIdInput": "PaymentId" }
        }"#,
    )
    .unwrap();
    let page = InputRegistry::from_json(r#"{"Maybe": ""}"#).unwrap();

    let assembly = config.assemble(&page).unwrap();
    let diagnostics = &assembly.diagnostics;
    assert!(diagnostics.contains(&ConfigError::MissingGroupCondition("group-1".to_string())));
    assert!(diagnostics.contains(&ConfigError::UnknownInput("Ghost".to_string())));
    assert!(diagnostics.contains(&ConfigError::MissingInputCondition("Maybe".to_string())));
    assert!(diagnostics.contains(&ConfigError::UnknownInput("PaymentId".to_string())));
}

#[test]
fn test_incomplete_entries_are_left_out() {
    let config = FormConfig::from_json(
        r#"{
            "groups": [
                { "name": "Untyped", "requiredInputs": [{ "input": "Zip", "inputType": "zip" }] },
                {
                    "name": "Claimant",
                    "validationType": "required",
                    "requiredInputs": [
                        { "input": "FirstName" },
                        { "inputType": "email" },
                        { "input": "ClaimNumber", "inputType": "claim_number" }
                    ]
                }
            ]
        }"#,
    )
    .unwrap();
    let page = InputRegistry::from_json(r#"{"Zip": "bad", "FirstName": "", "ClaimNumber": "ABC-1"}"#).unwrap();

    let assembly = config.assemble(&page).unwrap();
    let diagnostics = &assembly.diagnostics;
    assert!(diagnostics.contains(&ConfigError::MissingValidationType("Untyped".to_string())));
    assert!(diagnostics.contains(&ConfigError::IncompleteInput("Claimant".to_string(), "FirstName".to_string())));
    assert!(diagnostics.contains(&ConfigError::IncompleteInput("Claimant".to_string(), "#2".to_string())));

    let mut handler = assembly.handler;
    assert_eq!(handler.groups().len(), 1);
    assert_eq!(handler.groups()[0].fields().len(), 1);
    assert!(handler.are_groups_valid());
}

#[test]
fn test_minimum_age_custom_validation() {
    let config = FormConfig::from_json(
        r#"{
            "groups": [
                {
                    "name": "Claimant",
                    "validationType": "required",
                    "invalidMessage": "Claimants must be at least 18.",
                    "customValidation": { "kind": "minimum_age", "input": "DateOfBirth", "years": 18 },
                    "requiredInputs": [{ "input": "DateOfBirth", "inputType": "date" }]
                }
            ]
        }"#,
    )
    .unwrap();
    let page = InputRegistry::from_json(r#"{"DateOfBirth": "01/01/1970"}"#).unwrap();

    let mut handler = config.assemble(&page).unwrap().handler;
    assert!(handler.are_groups_valid());

    page.get("DateOfBirth").unwrap().set_value("01/01/2999");
    assert!(!handler.are_groups_valid());
    assert_eq!(handler.error_message(), "Claimants must be at least 18.");
}

#[test]
fn test_dispatch_reaches_bound_fields() {
    use claimform_core::{Field, FieldType, FormHandler, Group, MemoryInput};
    use std::cell::Cell;

    let zip = MemoryInput::with_text("Zip", "27513");
    let fired = Rc::new(Cell::new(0));
    let counter = fired.clone();
    let handler = FormHandler::new(vec![Group::required("Mailing").with_field(
        Field::bound(FieldType::Zip, zip.handle()).on(EventKind::Blur, move |ctx| {
            assert_eq!(ctx.input.value(), "27513");
            counter.set(counter.get() + 1);
        }),
    )]);

    assert_eq!(handler.dispatch("Zip", EventKind::Blur), 1);
    assert_eq!(handler.dispatch("Zip", EventKind::Input), 0);
    assert_eq!(handler.dispatch("City", EventKind::Blur), 0);
    assert_eq!(fired.get(), 1);
}
