//! Field Validators - One Predicate Per Semantic Field Type
//!
//! Validators are pure over their input: they read a `FieldValue`, write the
//! normalized value back into it, and return a `Verdict`.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Placeholder replaced by the field's display name when a message is resolved.
pub const FIELD_PLACEHOLDER: &str = "{field}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Name,
    Address,
    City,
    State,
    Zip,
    Phone,
    Email,
    ClaimNumber,
    ConfirmationNumber,
    Date,
    Checkbox,
    Signature,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    Numeric,
    Alphabetical,
    Alphanumeric,
    FreeForm,
}

/// Blank and Invalid are distinct: Blank means nothing was entered,
/// Invalid means something was entered in the wrong shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Valid,
    Invalid,
    Blank,
}

/// The current contents of one input surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    pub text: String,
    #[serde(default)]
    pub checked: bool,
}

impl FieldValue {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), checked: false }
    }

    pub fn checkbox(checked: bool) -> Self {
        Self { text: String::new(), checked }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: ValidationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Verdict {
    pub fn valid() -> Self {
        Self { status: ValidationStatus::Valid, message: None }
    }

    pub fn invalid() -> Self {
        Self { status: ValidationStatus::Invalid, message: None }
    }

    pub fn blank() -> Self {
        Self { status: ValidationStatus::Blank, message: None }
    }

    pub fn from_match(is_match: bool) -> Self {
        if is_match { Self::valid() } else { Self::invalid() }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_valid(&self) -> bool {
        self.status == ValidationStatus::Valid
    }
}

pub type ValidatorFn = fn(&mut FieldValue, ValidationMode) -> Verdict;

impl FieldType {
    pub const ALL: [FieldType; 13] = [
        FieldType::Name,
        FieldType::Address,
        FieldType::City,
        FieldType::State,
        FieldType::Zip,
        FieldType::Phone,
        FieldType::Email,
        FieldType::ClaimNumber,
        FieldType::ConfirmationNumber,
        FieldType::Date,
        FieldType::Checkbox,
        FieldType::Signature,
        FieldType::General,
    ];

    pub fn default_mode(self) -> ValidationMode {
        match self {
            FieldType::Name | FieldType::Address => ValidationMode::Alphanumeric,
            FieldType::City => ValidationMode::Alphabetical,
            FieldType::Zip => ValidationMode::Numeric,
            _ => ValidationMode::Alphanumeric,
        }
    }

    pub fn default_validator(self) -> ValidatorFn {
        match self {
            FieldType::Name => validate_name,
            FieldType::Address => validate_address,
            FieldType::City => validate_city,
            FieldType::State => validate_state,
            FieldType::Zip => validate_zip,
            FieldType::Phone => validate_phone,
            FieldType::Email => validate_email,
            FieldType::ClaimNumber => validate_claim_number,
            FieldType::ConfirmationNumber => validate_confirmation_number,
            FieldType::Date => validate_date,
            FieldType::Checkbox => validate_checkbox,
            FieldType::Signature => validate_signature,
            FieldType::General => validate_general,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Name => "name",
            FieldType::Address => "address",
            FieldType::City => "city",
            FieldType::State => "state",
            FieldType::Zip => "zip",
            FieldType::Phone => "phone",
            FieldType::Email => "email",
            FieldType::ClaimNumber => "claim_number",
            FieldType::ConfirmationNumber => "confirmation_number",
            FieldType::Date => "date",
            FieldType::Checkbox => "checkbox",
            FieldType::Signature => "signature",
            FieldType::General => "general",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        FieldType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("unknown field type: {}", s))
    }
}

impl FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "numeric" => Ok(ValidationMode::Numeric),
            "alphabetical" => Ok(ValidationMode::Alphabetical),
            "alphanumeric" => Ok(ValidationMode::Alphanumeric),
            "free_form" | "freeform" => Ok(ValidationMode::FreeForm),
            _ => Err(format!("unknown validation mode: {}", s)),
        }
    }
}

// `(?-u)`: `\d`, `\w` and `\s` match ASCII only.
static NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z' -]+$").expect("name regex is valid"));
static ADDRESS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u)^[-#A-Za-z\s0-9.]+$").expect("address regex is valid"));
static CITY_ALPHA_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-A-Za-z ]+$").expect("city regex is valid"));
static ALNUM_RUN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9]+").expect("alphanumeric regex is valid"));
/// Five digits, then an optional separated or bracketed extension of up to four digits.
static ZIP_NUMERIC_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)^\d{5}(?:[-.\s]\d{1,4}|\[\d{1,4}\])?$").expect("zip regex is valid")
});
static ZIP_POSTAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9]{5}").expect("postal regex is valid"));
static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)(?:\d\s)?\(?\d{3}\)?-?\s?\d{3}-?\s?\d{4}").expect("phone regex is valid")
});
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)^\w+(?:[.-]?\w+)*@\w+(?:[.-]?\w+)*(?:\.[A-Za-z]{2,4})+$")
        .expect("email regex is valid")
});
static CLAIM_NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u)^[A-Z]{3}-\d{1,8}$").expect("claim number regex is valid"));
static CONFIRMATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u)^\d{1,12}$").expect("confirmation regex is valid"));
static DATE_MDY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("date regex is valid")
});
static DATE_YMD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)^(\d{4})/(\d{1,2})/(\d{1,2})$").expect("date regex is valid")
});

/// Trims the value in place; returns true when nothing is left.
fn trim_in_place(value: &mut FieldValue) -> bool {
    let trimmed = value.text.trim();
    if trimmed.len() != value.text.len() {
        value.text = trimmed.to_string();
    }
    value.text.is_empty()
}

pub fn validate_general(value: &mut FieldValue, _mode: ValidationMode) -> Verdict {
    if value.is_blank() {
        return Verdict::blank();
    }
    Verdict::valid()
}

pub fn validate_name(value: &mut FieldValue, _mode: ValidationMode) -> Verdict {
    if trim_in_place(value) {
        return Verdict::blank();
    }
    if NAME_REGEX.is_match(&value.text) {
        Verdict::valid()
    } else {
        Verdict::invalid().with_message(format!(
            "{} must only contain Alphabetical characters, hyphens, or apostrophes.",
            FIELD_PLACEHOLDER
        ))
    }
}

pub fn validate_address(value: &mut FieldValue, mode: ValidationMode) -> Verdict {
    if trim_in_place(value) {
        return Verdict::blank();
    }
    let is_match = match mode {
        ValidationMode::Alphanumeric => ADDRESS_REGEX.is_match(&value.text),
        _ => value.text.chars().any(|c| !c.is_whitespace()),
    };
    Verdict::from_match(is_match)
}

pub fn validate_city(value: &mut FieldValue, mode: ValidationMode) -> Verdict {
    if trim_in_place(value) {
        return Verdict::blank();
    }
    let is_match = match mode {
        ValidationMode::Alphabetical => CITY_ALPHA_REGEX.is_match(&value.text),
        _ => ALNUM_RUN_REGEX.is_match(&value.text),
    };
    Verdict::from_match(is_match)
}

/// Selection-based; presence is the whole contract.
pub fn validate_state(value: &mut FieldValue, _mode: ValidationMode) -> Verdict {
    if value.is_blank() {
        return Verdict::blank();
    }
    Verdict::valid()
}

pub fn validate_zip(value: &mut FieldValue, mode: ValidationMode) -> Verdict {
    if trim_in_place(value) {
        return Verdict::blank();
    }
    let is_match = match mode {
        ValidationMode::Numeric => ZIP_NUMERIC_REGEX.is_match(&value.text),
        _ => ZIP_POSTAL_REGEX.is_match(&value.text),
    };
    Verdict::from_match(is_match)
}

pub fn validate_phone(value: &mut FieldValue, _mode: ValidationMode) -> Verdict {
    if value.is_blank() {
        return Verdict::blank();
    }
    Verdict::from_match(PHONE_REGEX.is_match(&value.text))
}

pub fn validate_email(value: &mut FieldValue, _mode: ValidationMode) -> Verdict {
    if trim_in_place(value) {
        return Verdict::blank();
    }
    Verdict::from_match(EMAIL_REGEX.is_match(&value.text))
}

pub fn validate_claim_number(value: &mut FieldValue, _mode: ValidationMode) -> Verdict {
    if trim_in_place(value) {
        return Verdict::blank();
    }
    value.text = value.text.to_uppercase();
    Verdict::from_match(CLAIM_NUMBER_REGEX.is_match(&value.text))
}

pub fn validate_confirmation_number(value: &mut FieldValue, _mode: ValidationMode) -> Verdict {
    if trim_in_place(value) {
        return Verdict::blank();
    }
    value.text = value.text.to_uppercase();
    Verdict::from_match(CONFIRMATION_REGEX.is_match(&value.text))
}

pub fn validate_date(value: &mut FieldValue, mode: ValidationMode) -> Verdict {
    validate_date_on(value, mode, Local::now().date_naive())
}

/// Date check against an explicit calendar day; the entered date must be
/// strictly earlier than `today`.
pub fn validate_date_on(value: &mut FieldValue, _mode: ValidationMode, today: NaiveDate) -> Verdict {
    if trim_in_place(value) {
        return Verdict::blank();
    }
    match parse_date(&value.text) {
        Some(date) => Verdict::from_match(date < today),
        None => Verdict::invalid(),
    }
}

/// Parses `MM/DD/YYYY`, `M/D/YYYY` or `YYYY/MM/DD`, with hyphens accepted as
/// separators. Years outside 1000..=3000 are rejected. Day limits come from
/// the explicit month table and Gregorian leap rule below, ahead of chrono.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let normalized = text.trim().replace('-', "/");

    let (year, month, day) = if let Some(caps) = DATE_MDY_REGEX.captures(&normalized) {
        (caps[3].parse::<i32>().ok()?, caps[1].parse::<u32>().ok()?, caps[2].parse::<u32>().ok()?)
    } else if let Some(caps) = DATE_YMD_REGEX.captures(&normalized) {
        (caps[1].parse::<i32>().ok()?, caps[2].parse::<u32>().ok()?, caps[3].parse::<u32>().ok()?)
    } else {
        return None;
    };

    if !(1000..=3000).contains(&year) || !(1..=12).contains(&month) {
        return None;
    }
    if day == 0 || day > days_in_month(year, month) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

fn is_leap_year(year: i32) -> bool {
    year % 400 == 0 || (year % 100 != 0 && year % 4 == 0)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    const MONTH_LENGTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    if month == 2 && is_leap_year(year) {
        29
    } else {
        MONTH_LENGTH[(month - 1) as usize]
    }
}

/// Checkboxes are never Blank: unchecked is Invalid.
pub fn validate_checkbox(value: &mut FieldValue, _mode: ValidationMode) -> Verdict {
    Verdict::from_match(value.checked)
}

/// The slot holds base64 image data written by the drawing surface.
pub fn validate_signature(value: &mut FieldValue, _mode: ValidationMode) -> Verdict {
    if value.is_blank() {
        return Verdict::blank();
    }
    Verdict::valid()
}
