//! ClaimForm Core - Declarative Claim Form Validation
//!
//! # Ground Rules
//! 1. Validation Never Throws: failures are statuses and messages
//! 2. Collect Everything: every group and field is evaluated on every pass
//! 3. Blank Is Not Invalid: empty required inputs get the fallback summary
//! 4. Submit Goes Through the Gate: no submission without a passing pass

pub mod validators;
pub mod surface;
pub mod events;
pub mod field;
pub mod group;
pub mod disbursement;
pub mod signature;
pub mod hashing;
pub mod form;
pub mod config;
pub mod error;

pub use validators::{FieldType, FieldValue, ValidationMode, ValidationStatus, Verdict};
pub use events::{EventContext, EventKind};
pub use surface::{Decorator, ErrorPanel, InputSurface, Mark, MarkBoard, MemoryInput, SubmitButton};
pub use field::{Field, FieldRole, Tier};
pub use group::{Group, GroupKind, ValidationType};
pub use disbursement::{DigitalDisbursement, PaymentInfo};
pub use signature::SignaturePad;
pub use form::{FormHandler, GateState, Submission, SubmitOutcome, DEFAULT_MESSAGE};
pub use config::{Assembly, FormConfig, InputRegistry};
pub use error::{ConfigError, FormError};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
