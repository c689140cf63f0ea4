//! Classmark CLI library
//!
//! This module contains the core CLI logic: load a text, bring in existing
//! annotations, pre-annotate or replay a session script, and write the
//! result as a JSON export envelope.

pub mod error_adapter;
pub mod heuristic;
pub mod script;

mod args;
mod config;
mod error;

pub use args::Args;
pub use error::CliError;

use std::fs;

use log::{info, warn};

use classmark::{
    AnnotationSession,
    preannotate::{Analyzer, CancelToken, LazyAnalyzer},
};

use heuristic::HeuristicAnalyzer;

/// Run the Classmark CLI application
///
/// # Errors
///
/// Returns `CliError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Annotation documents rejected by the JSON sync bridge
/// - Malformed session scripts, or statements that do not fit the text
/// - Failed pre-annotation
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Annotating text"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let text = fs::read_to_string(&args.input)?;

    let mut session = AnnotationSession::new(app_config);
    session.set_text(text);
    let mut analyzer =
        LazyAnalyzer::new(|| Ok(Box::new(HeuristicAnalyzer::new()) as Box<dyn Analyzer>));

    if args.pre_annotate {
        let report = session.pre_annotate(&mut analyzer, &CancelToken::new())?;
        info!(report:%; "Text pre-annotated");
    }

    if let Some(path) = &args.annotations {
        let json = fs::read_to_string(path)?;
        let warnings = session.sync_from_json(&json)?;
        if !warnings.is_empty() {
            warn!(count = warnings.len(); "Annotations loaded with corrections");
        }
        info!(path = path.as_str(); "Annotations loaded");
    }

    if let Some(path) = &args.script {
        let src = fs::read_to_string(path)?;
        let statements =
            script::parse_script(&src).map_err(|err| CliError::new_script_error(err, &src))?;
        script::run_script(&mut session, &statements, &mut analyzer)
            .map_err(|err| CliError::new_script_error(err, &src))?;
    }

    fs::write(&args.output, session.export_envelope())?;

    info!(
        output_file = args.output,
        classes = session.model().classes().len(),
        relationships = session.model().relationships().len();
        "Annotations exported successfully"
    );

    Ok(())
}
