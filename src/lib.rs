//! Labelwire: annotation data model and import pipeline.
//!
//! Labelwire models data-labeling annotations in memory, converts them
//! to and from the platform's newline-delimited JSON import format,
//! validates payloads before any bytes move, and drives the
//! asynchronous import job through to its per-record outcomes.
//!
//! # Modules
//!
//! - [`annotation`]: the domain model (Label, object and classification
//!   variants, feature references)
//! - [`ndjson`]: bidirectional conversion between labels and wire
//!   records, plus NDJSON file helpers
//! - [`validation`]: pre-upload validation and structured reports
//! - [`import`]: submission, polling, and artifact access for the
//!   remote import job
//! - [`error`]: error types for labelwire operations

pub mod annotation;
pub mod error;
pub mod import;
pub mod ndjson;
pub mod validation;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use error::LabelwireError;
pub use ndjson::{deserialize, serialize};
pub use validation::{validate_records, ValidateOptions};

/// The labelwire CLI application.
#[derive(Parser)]
#[command(name = "labelwire")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Validate an NDJSON import payload for errors and warnings.
    Validate(ValidateArgs),
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    /// Input NDJSON file to validate.
    input: PathBuf,

    /// Ceiling on annotations per label group.
    #[arg(long, default_value_t = 5000)]
    limit: usize,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Run the labelwire CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), LabelwireError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Validate(args)) => run_validate(args),
        None => {
            println!("labelwire {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Annotation data model and import pipeline.");
            println!();
            println!("Run 'labelwire --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the validate subcommand.
fn run_validate(args: ValidateArgs) -> Result<(), LabelwireError> {
    let records = ndjson::io::read_ndjson(&args.input)?;

    let opts = ValidateOptions {
        max_annotations_per_label: args.limit,
        strict: args.strict,
    };
    let report = validate_records(&records, &opts);

    match args.output.as_str() {
        "json" => {
            println!("{{");
            println!("  \"error_count\": {},", report.error_count());
            println!("  \"warning_count\": {},", report.warning_count());
            println!("  \"issues\": [");
            for (i, issue) in report.issues.iter().enumerate() {
                let comma = if i < report.issues.len() - 1 { "," } else { "" };
                println!("    {{");
                println!("      \"severity\": \"{:?}\",", issue.severity);
                println!("      \"code\": \"{:?}\",", issue.code);
                println!(
                    "      \"message\": \"{}\",",
                    issue.message.replace('"', "\\\"")
                );
                println!("      \"context\": \"{}\"", issue.context);
                println!("    }}{}", comma);
            }
            println!("  ]");
            println!("}}");
        }
        "text" => {
            print!("{}", report);
        }
        other => {
            return Err(LabelwireError::UnsupportedFormat(format!(
                "'{}' (supported: text, json)",
                other
            )));
        }
    }

    let has_errors = report.error_count() > 0;
    let has_warnings = report.warning_count() > 0;

    if has_errors || (args.strict && has_warnings) {
        Err(LabelwireError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}
