use crate::cli::ValidateArgs;
use grimoveis::error::AppError;
use grimoveis::listings::validate_create;
use std::process::ExitCode;

/// Violations for one raw JSON document, or an empty list when it would be accepted.
pub(crate) fn violations(raw: &str) -> Vec<String> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(document) => match validate_create(&document) {
            Ok(_) => Vec::new(),
            Err(errors) => errors.into_messages(),
        },
        Err(err) => vec![format!("document is not valid JSON: {err}")],
    }
}

pub(crate) fn run(args: ValidateArgs) -> Result<ExitCode, AppError> {
    let raw = std::fs::read_to_string(&args.file)?;
    let violations = violations(&raw);

    if violations.is_empty() {
        println!("valid");
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} is not a valid listing:", args.file.display());
    for violation in &violations {
        println!("- {violation}");
    }
    Ok(ExitCode::FAILURE)
}
