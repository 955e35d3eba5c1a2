//! Form Configuration - Declarative Form Descriptions
//!
//! A form is described as JSON and assembled against the inputs present on
//! the page. Problems in the description are diagnostics: they are logged and
//! returned, and assembly carries on with the rest.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::disbursement::{DigitalDisbursement, DEFAULT_DISBURSEMENT_MESSAGE};
use crate::error::{ConfigError, FormError};
use crate::field::{Field, FieldRole, Predicate};
use crate::form::{FormHandler, DEFAULT_MESSAGE};
use crate::group::{minimum_age, Group, GroupKind, ValidationType};
use crate::surface::{InputSurface, MemoryInput, SurfaceHandle};
use crate::validators::{FieldType, FieldValue, ValidationMode};
use crate::ENGINE_VERSION;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub engine_min_version: Option<String>,
    #[serde(default = "default_message")]
    pub default_message: String,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
    #[serde(default)]
    pub digital_disbursements: Option<DisbursementConfig>,
}

fn default_message() -> String {
    DEFAULT_MESSAGE.to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupConfig {
    #[serde(default)]
    pub name: Option<String>,
    /// Required; a group without one is reported and left out.
    #[serde(default)]
    pub validation_type: Option<ValidationType>,
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub invalid_message: Option<String>,
    #[serde(default)]
    pub override_default_handler_message: bool,
    #[serde(default)]
    pub custom_validation: Option<CustomValidation>,
    #[serde(default)]
    pub required_inputs: Vec<InputConfig>,
    #[serde(default)]
    pub conditional_inputs: Vec<InputConfig>,
    #[serde(default)]
    pub optional_inputs: Vec<InputConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputConfig {
    /// Id of the page input holding the value. Entries missing the id or
    /// the type are reported and left out.
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub input_type: Option<FieldType>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub validation_mode: Option<ValidationMode>,
    /// Decoration target, when different from the input.
    #[serde(default)]
    pub error_node: Option<String>,
    /// Requirement condition; only meaningful for conditional inputs.
    #[serde(default)]
    pub condition: Option<Condition>,
}

/// Requirement conditions over page inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "when", rename_all = "snake_case")]
pub enum Condition {
    Always,
    Never,
    Checked { input: String },
    Unchecked { input: String },
    Filled { input: String },
    Equals { input: String, value: String },
    All { conditions: Vec<Condition> },
    Any { conditions: Vec<Condition> },
    Not { condition: Box<Condition> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CustomValidation {
    MinimumAge { input: String, years: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisbursementConfig {
    pub widget_key: String,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub payment_id_input: Option<String>,
    #[serde(default)]
    pub payment_method_input: Option<String>,
    #[serde(default)]
    pub error_msg: Option<String>,
}

/// One input's state as written in a page file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputState {
    Checked(bool),
    Text(String),
    Full(FieldValue),
}

impl From<InputState> for FieldValue {
    fn from(state: InputState) -> Self {
        match state {
            InputState::Checked(checked) => FieldValue::checkbox(checked),
            InputState::Text(text) => FieldValue::text(text),
            InputState::Full(value) => value,
        }
    }
}

/// The inputs present on the page, by id.
#[derive(Debug, Clone, Default)]
pub struct InputRegistry {
    inputs: BTreeMap<String, MemoryInput>,
}

impl InputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_page(page: BTreeMap<String, InputState>) -> Self {
        let mut registry = Self::new();
        for (id, state) in page {
            registry.insert(MemoryInput::with_value(&id, state.into()));
        }
        registry
    }

    pub fn from_json(json: &str) -> Result<Self, FormError> {
        let page: BTreeMap<String, InputState> = serde_json::from_str(json)?;
        Ok(Self::from_page(page))
    }

    pub fn from_file(path: &Path) -> Result<Self, FormError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn insert(&mut self, input: MemoryInput) {
        self.inputs.insert(input.id().to_string(), input);
    }

    pub fn get(&self, id: &str) -> Option<&MemoryInput> {
        self.inputs.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.inputs.keys().map(String::as_str)
    }
}

/// An assembled handler plus every setup problem found on the way.
pub struct Assembly {
    pub handler: FormHandler,
    pub diagnostics: Vec<ConfigError>,
}

/// Logs a setup problem once and keeps it for the caller.
pub(crate) fn report(diagnostics: &mut Vec<ConfigError>, problem: ConfigError) {
    if diagnostics.contains(&problem) {
        return;
    }
    error!(%problem, "form configuration error");
    diagnostics.push(problem);
}

struct Assembler<'a> {
    inputs: &'a InputRegistry,
    diagnostics: Vec<ConfigError>,
}

impl FormConfig {
    pub fn from_json(json: &str) -> Result<Self, FormError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, FormError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Fails only when the description needs a newer engine.
    pub fn check_engine_version(&self) -> Result<(), FormError> {
        let Some(min) = &self.engine_min_version else {
            return Ok(());
        };
        let engine_ver = semver::Version::parse(ENGINE_VERSION)
            .map_err(|_| FormError::InvalidVersion(ENGINE_VERSION.to_string()))?;
        let min_ver = semver::Version::parse(min).map_err(|_| FormError::InvalidVersion(min.clone()))?;

        if engine_ver < min_ver {
            return Err(FormError::EngineVersionMismatch(min.clone(), ENGINE_VERSION.to_string()));
        }
        Ok(())
    }

    pub fn assemble(&self, inputs: &InputRegistry) -> Result<Assembly, FormError> {
        self.check_engine_version()?;

        let mut assembler = Assembler { inputs, diagnostics: vec![] };
        let groups = self
            .groups
            .iter()
            .enumerate()
            .filter_map(|(idx, group)| assembler.group(idx, group))
            .collect();

        let mut handler = FormHandler::new(groups).with_default_message(self.default_message.clone());
        if let Some(dd) = &self.digital_disbursements {
            handler = handler.with_disbursement(assembler.disbursement(dd));
        }

        let mut diagnostics = assembler.diagnostics;
        for problem in handler.wiring_diagnostics() {
            report(&mut diagnostics, problem);
        }
        Ok(Assembly { handler, diagnostics })
    }
}

impl Assembler<'_> {
    fn report(&mut self, problem: ConfigError) {
        report(&mut self.diagnostics, problem);
    }

    fn lookup(&mut self, id: &str) -> Option<MemoryInput> {
        let found = self.inputs.get(id).cloned();
        if found.is_none() {
            self.report(ConfigError::UnknownInput(id.to_string()));
        }
        found
    }

    fn group(&mut self, idx: usize, config: &GroupConfig) -> Option<Group> {
        let name = config.name.clone().unwrap_or_else(|| format!("group-{}", idx + 1));

        let kind = match config.validation_type {
            None => {
                self.report(ConfigError::MissingValidationType(name));
                return None;
            }
            Some(ValidationType::Required) => GroupKind::Required,
            Some(ValidationType::Conditional) => match &config.condition {
                Some(condition) => GroupKind::Conditional(self.predicate(condition)),
                None => {
                    self.report(ConfigError::MissingGroupCondition(name.clone()));
                    GroupKind::Conditional(Rc::new(|| true))
                }
            },
        };

        let mut group = Group::new(name.clone(), kind);
        for (pos, input) in config.required_inputs.iter().enumerate() {
            if let Some(field) = self.field(&name, pos, input, |_| FieldRole::Required) {
                group = group.with_field(field);
            }
        }
        for (pos, input) in config.conditional_inputs.iter().enumerate() {
            let role = |assembler: &mut Self| {
                let predicate: Predicate = match &input.condition {
                    Some(condition) => assembler.predicate(condition),
                    None => {
                        let id = input.input.clone().unwrap_or_default();
                        assembler.report(ConfigError::MissingInputCondition(id));
                        Rc::new(|| true)
                    }
                };
                FieldRole::Conditional(predicate)
            };
            if let Some(field) = self.field(&name, pos, input, role) {
                group = group.with_field(field);
            }
        }
        for (pos, input) in config.optional_inputs.iter().enumerate() {
            if let Some(field) = self.field(&name, pos, input, |_| FieldRole::Optional) {
                group = group.with_field(field);
            }
        }

        if let Some(message) = &config.invalid_message {
            group = group.with_invalid_message(message.clone());
        }
        if config.override_default_handler_message {
            group = group.with_default_message_override();
        }
        if let Some(custom) = &config.custom_validation {
            match custom {
                CustomValidation::MinimumAge { input, years } => {
                    let dob = self.lookup(input).unwrap_or_else(|| MemoryInput::new(input));
                    group = group.with_group_validation(minimum_age(dob.handle(), *years));
                }
            }
        }
        Some(group)
    }

    /// Builds one field; `role` runs only once the entry is known to be complete.
    fn field(
        &mut self,
        group: &str,
        pos: usize,
        config: &InputConfig,
        role: impl FnOnce(&mut Self) -> FieldRole,
    ) -> Option<Field> {
        let (Some(id), Some(input_type)) = (&config.input, config.input_type) else {
            let label = config.input.clone().unwrap_or_else(|| format!("#{}", pos + 1));
            self.report(ConfigError::IncompleteInput(group.to_string(), label));
            return None;
        };

        let role = role(self);
        let mut field = Field::new(id.clone(), input_type).with_role(role);
        if let Some(input) = self.lookup(id) {
            field = field.with_input(input.handle());
        }
        if let Some(display_name) = &config.display_name {
            field = field.with_display_name(display_name.clone());
        }
        if let Some(message) = &config.message {
            field = field.with_message(message.clone());
        }
        if let Some(mode) = config.validation_mode {
            field = field.with_mode(mode);
        }
        if let Some(target) = &config.error_node {
            field = field.with_decoration_target(target.clone());
        }
        Some(field)
    }

    fn predicate(&mut self, condition: &Condition) -> Predicate {
        match condition {
            Condition::Always => Rc::new(|| true),
            Condition::Never => Rc::new(|| false),
            Condition::Checked { input } => {
                let surface = self.surface(input);
                Rc::new(move || surface.is_checked())
            }
            Condition::Unchecked { input } => {
                let surface = self.surface(input);
                Rc::new(move || !surface.is_checked())
            }
            Condition::Filled { input } => {
                let surface = self.surface(input);
                Rc::new(move || !surface.value().trim().is_empty())
            }
            Condition::Equals { input, value } => {
                let surface = self.surface(input);
                let expected = value.clone();
                Rc::new(move || surface.value() == expected)
            }
            Condition::All { conditions } => {
                let parts: Vec<Predicate> = conditions.iter().map(|c| self.predicate(c)).collect();
                Rc::new(move || parts.iter().all(|p| p()))
            }
            Condition::Any { conditions } => {
                let parts: Vec<Predicate> = conditions.iter().map(|c| self.predicate(c)).collect();
                Rc::new(move || parts.iter().any(|p| p()))
            }
            Condition::Not { condition } => {
                let inner = self.predicate(condition);
                Rc::new(move || !inner())
            }
        }
    }

    /// Unknown inputs read as a permanently empty control.
    fn surface(&mut self, id: &str) -> SurfaceHandle {
        self.lookup(id).unwrap_or_else(|| MemoryInput::new(id)).handle()
    }

    fn disbursement(&mut self, config: &DisbursementConfig) -> DigitalDisbursement {
        let mut dd = DigitalDisbursement::new(config.widget_key.clone())
            .with_required(config.required)
            .with_message(
                config
                    .error_msg
                    .clone()
                    .unwrap_or_else(|| DEFAULT_DISBURSEMENT_MESSAGE.to_string()),
            );
        if let Some(id) = &config.payment_id_input {
            if let Some(input) = self.lookup(id) {
                dd = dd.with_payment_id(input.handle());
            }
        }
        if let Some(id) = &config.payment_method_input {
            if let Some(input) = self.lookup(id) {
                dd = dd.with_payment_method(input.handle());
            }
        }
        dd
    }
}
