//! Digital Disbursement - Payment Capture Check
//!
//! The payment widget is asynchronous and external. It reports back through
//! `on_submitted`, which writes into two value slots; the submit-time check
//! only reads those slots.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::ConfigError;
use crate::surface::SurfaceHandle;

/// Widget key used while the real widget has not been provisioned.
pub const PLACEHOLDER_WIDGET_KEY: &str = "temp";

pub const DEFAULT_DISBURSEMENT_MESSAGE: &str =
    "Please complete the payment information in order to continue.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub token: String,
    pub method: String,
}

pub struct DigitalDisbursement {
    widget_key: String,
    required: bool,
    payment_id: Option<SurfaceHandle>,
    payment_method: Option<SurfaceHandle>,
    message: String,
}

impl DigitalDisbursement {
    pub fn new(widget_key: impl Into<String>) -> Self {
        Self {
            widget_key: widget_key.into(),
            required: true,
            payment_id: None,
            payment_method: None,
            message: DEFAULT_DISBURSEMENT_MESSAGE.to_string(),
        }
    }

    pub fn with_payment_id(mut self, slot: SurfaceHandle) -> Self {
        self.payment_id = Some(slot);
        self
    }

    pub fn with_payment_method(mut self, slot: SurfaceHandle) -> Self {
        self.payment_method = Some(slot);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn widget_key(&self) -> &str {
        &self.widget_key
    }

    pub fn payment_id(&self) -> Option<&SurfaceHandle> {
        self.payment_id.as_ref()
    }

    pub fn payment_method(&self) -> Option<&SurfaceHandle> {
        self.payment_method.as_ref()
    }

    /// False while the widget carries the placeholder key.
    pub fn is_ready(&self) -> bool {
        !self.widget_key.is_empty() && self.widget_key != PLACEHOLDER_WIDGET_KEY
    }

    /// Missing slots, reported once at setup.
    pub fn diagnostics(&self) -> Vec<ConfigError> {
        let mut problems = vec![];
        if self.payment_id.is_none() {
            problems.push(ConfigError::MissingPaymentSlot("Id".to_string()));
        }
        if self.payment_method.is_none() {
            problems.push(ConfigError::MissingPaymentSlot("Method".to_string()));
        }
        problems
    }

    /// Completion callback from the payment widget.
    pub fn on_submitted(&self, info: &PaymentInfo) -> Vec<ConfigError> {
        let mut problems = vec![];
        match &self.payment_id {
            Some(slot) => slot.set_value(&info.token),
            None => problems.push(ConfigError::MissingPaymentSlot("Id".to_string())),
        }
        match &self.payment_method {
            Some(slot) => slot.set_value(&info.method),
            None => problems.push(ConfigError::MissingPaymentSlot("Method".to_string())),
        }
        for problem in &problems {
            error!(%problem, "payment capture could not be recorded");
        }
        problems
    }

    /// The failure message when a ready, required widget lacks either slot value.
    pub fn check(&self) -> Option<&str> {
        if !self.required || !self.is_ready() {
            return None;
        }
        let filled = |slot: &Option<SurfaceHandle>| {
            slot.as_ref().is_some_and(|s| !s.value().trim().is_empty())
        };
        if filled(&self.payment_id) && filled(&self.payment_method) {
            None
        } else {
            Some(self.message.as_str())
        }
    }
}
