//! ClaimForm CLI - Run form validation outside the browser
//!
//! Commands: check, validate, submit
//! Outputs JSON to stdout
//! Returns 2 when the input does not pass validation

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use claimform_core::{
    config::{FormConfig, InputRegistry},
    ErrorPanel, FieldType, FieldValue, FormError, MarkBoard, SubmitOutcome, ValidationMode,
};

#[derive(Parser)]
#[command(name = "claimform-cli")]
#[command(about = "ClaimForm CLI - Declarative claim form validation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log filter (e.g. "warn", "claimform_core=debug")
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a single value
    Check {
        /// Field type (name, address, city, state, zip, phone, email,
        /// claim-number, confirmation-number, date, checkbox, signature, general)
        #[arg(short = 't', long = "type")]
        field_type: FieldType,

        /// Value to validate
        #[arg(short, long, default_value = "")]
        value: String,

        /// Validation mode override (numeric, alphabetical, alphanumeric, free-form)
        #[arg(short, long)]
        mode: Option<ValidationMode>,

        /// Checked state, for checkboxes
        #[arg(long)]
        checked: bool,
    },

    /// Validate every group of a form against a page
    Validate {
        /// Form configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Page input values (JSON)
        #[arg(short, long)]
        page: PathBuf,
    },

    /// Run the submission gate for a form against a page
    Submit {
        /// Form configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Page input values (JSON)
        #[arg(short, long)]
        page: PathBuf,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => println!(r#"{{"error": "Failed to render output: {}"}}"#, e),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Check { field_type, value, mode, checked } => {
            let mut field_value = FieldValue { text: value, checked };
            let mode = mode.unwrap_or_else(|| field_type.default_mode());
            let verdict = field_type.default_validator()(&mut field_value, mode);

            print_json(&serde_json::json!({
                "type": field_type,
                "mode": mode,
                "status": verdict.status,
                "normalized": field_value.text,
                "message": verdict.message,
            }));
            if verdict.is_valid() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }

        Commands::Validate { config, page } => {
            let (config, inputs) = match load(&config, &page) {
                Ok(loaded) => loaded,
                Err(code) => return code,
            };
            let assembly = match config.assemble(&inputs) {
                Ok(a) => a,
                Err(e) => {
                    print_json(&assembly_error(e));
                    return ExitCode::FAILURE;
                }
            };

            let marks = Rc::new(MarkBoard::new());
            let mut handler = assembly.handler.with_decorator(marks.clone());
            let valid = handler.are_groups_valid();

            print_json(&serde_json::json!({
                "valid": valid,
                "errors": handler.error_message(),
                "fields": handler.field_reports(),
                "marks": marks.marks(),
                "diagnostics": assembly.diagnostics.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
            }));
            if valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }

        Commands::Submit { config, page } => {
            let (config, inputs) = match load(&config, &page) {
                Ok(loaded) => loaded,
                Err(code) => return code,
            };
            let assembly = match config.assemble(&inputs) {
                Ok(a) => a,
                Err(e) => {
                    print_json(&assembly_error(e));
                    return ExitCode::FAILURE;
                }
            };

            let panel = Rc::new(ErrorPanel::new());
            let mut handler = assembly.handler.with_error_surface(panel.clone());
            match handler.submit() {
                Ok(outcome) => {
                    let submitted = matches!(outcome, SubmitOutcome::Submitted(_));
                    print_json(&serde_json::json!({
                        "success": submitted,
                        "outcome": outcome,
                        "errorPanel": { "visible": panel.is_visible(), "content": panel.content() },
                    }));
                    if submitted {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::from(2)
                    }
                }
                Err(e) => {
                    print_json(&serde_json::json!({ "success": false, "error": e.to_string() }));
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn assembly_error(e: FormError) -> serde_json::Value {
    serde_json::json!({ "valid": false, "error": e.to_string() })
}

fn load(config: &PathBuf, page: &PathBuf) -> Result<(FormConfig, InputRegistry), ExitCode> {
    let config = FormConfig::from_file(config).map_err(|e| {
        print_json(&serde_json::json!({ "error": format!("Failed to load form config: {}", e) }));
        ExitCode::FAILURE
    })?;
    let inputs = InputRegistry::from_file(page).map_err(|e| {
        print_json(&serde_json::json!({ "error": format!("Failed to load page: {}", e) }));
        ExitCode::FAILURE
    })?;
    Ok((config, inputs))
}
