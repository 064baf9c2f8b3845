//! Fmt and validate command implementations

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::loader::atomic_write;
use crate::fmt::format_source;
use crate::telemetry::{self, ErrorEntry};
use crate::texture::ImageTextureLoader;
use crate::validate::{Severity, ValidationIssue, Validator};

use super::{expand_inputs, load_settings, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Execute the fmt command
pub fn run_fmt(files: &[PathBuf], check: bool, stdout_mode: bool) -> ExitCode {
    let files = expand_inputs(files);
    if files.is_empty() {
        eprintln!("Error: No files to format");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let mut needs_formatting = false;

    for file in &files {
        let content = match std::fs::read_to_string(file) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: Cannot read '{}': {}", file.display(), e);
                return ExitCode::from(EXIT_ERROR);
            }
        };

        // A file that fails to read is left untouched
        let formatted = match format_source(Some(file), &content) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Error: Cannot format '{}': {}", file.display(), e);
                telemetry::log_error(
                    &ErrorEntry::from_schema_error("fmt", &e).with_file(file.display().to_string()),
                );
                return ExitCode::from(EXIT_ERROR);
            }
        };

        if check {
            if content != formatted {
                eprintln!("{}: needs formatting", file.display());
                needs_formatting = true;
            }
        } else if stdout_mode {
            print!("{}", formatted);
        } else if content != formatted {
            if let Err(e) = atomic_write(file, formatted.as_bytes()) {
                eprintln!("Error: Cannot write '{}': {}", file.display(), e);
                return ExitCode::from(EXIT_ERROR);
            }
            eprintln!("{}: formatted", file.display());
        } else {
            eprintln!("{}: already formatted", file.display());
        }
    }

    if check && needs_formatting {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}

fn issue_json(file: &Path, issue: &ValidationIssue) -> serde_json::Value {
    let mut obj = serde_json::json!({
        "file": file.display().to_string(),
        "line": issue.line,
        "type": issue.issue_type.to_string(),
        "message": issue.message,
    });
    if let Some(ref ctx) = issue.context {
        obj["context"] = serde_json::json!(ctx);
    }
    if let Some(ref sug) = issue.suggestion {
        obj["suggestion"] = serde_json::json!(sug);
    }
    obj
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Execute the validate command
pub fn run_validate(files: &[PathBuf], config_path: Option<&Path>, strict: bool, json: bool) -> ExitCode {
    let files = expand_inputs(files);
    if files.is_empty() {
        eprintln!("Error: No files to validate");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let config = match load_settings("validate", config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let loader = ImageTextureLoader;

    let mut issues: Vec<(PathBuf, ValidationIssue)> = Vec::new();
    for path in &files {
        if !json {
            println!("Validating {}...", path.display());
        }
        let mut validator = Validator::new(&config, &loader);
        if let Err(e) = validator.validate_file(path) {
            eprintln!("Error: Cannot read '{}': {}", path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
        issues.extend(validator.into_issues().into_iter().map(|i| (path.clone(), i)));
    }

    for (path, issue) in issues.iter().filter(|(_, i)| i.severity == Severity::Error) {
        let mut entry = ErrorEntry::new("validate", issue.issue_type.to_string(), &issue.message)
            .with_file(path.display().to_string());
        if let Some(ref sug) = issue.suggestion {
            entry = entry.with_suggestion(sug);
        }
        telemetry::log_error(&entry);
    }

    let error_count = issues.iter().filter(|(_, i)| i.severity == Severity::Error).count();
    let warning_count = issues.len() - error_count;

    let has_failures = error_count > 0 || (strict && warning_count > 0);

    if json {
        let errors: Vec<_> = issues
            .iter()
            .filter(|(_, i)| i.severity == Severity::Error)
            .map(|(p, i)| issue_json(p, i))
            .collect();
        let warnings: Vec<_> = issues
            .iter()
            .filter(|(_, i)| i.severity == Severity::Warning)
            .map(|(p, i)| issue_json(p, i))
            .collect();

        let output = serde_json::json!({
            "valid": !has_failures,
            "errors": errors,
            "warnings": warnings,
        });

        match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: Cannot serialize report: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else if issues.is_empty() {
        println!();
        println!("No issues found.");
    } else {
        println!();
        for (path, issue) in &issues {
            let location = match issue.line {
                Some(line) => format!("{}:{}", path.display(), line),
                None => path.display().to_string(),
            };
            let mut msg = format!("{}: {} - {}", location, issue.severity, issue.message);

            if let Some(ref ctx) = issue.context {
                msg.push_str(&format!(" ({})", ctx));
            }
            if let Some(ref sug) = issue.suggestion {
                msg.push_str(&format!(" ({})", sug));
            }

            eprintln!("{}", msg);
        }

        println!();
        match (error_count, warning_count) {
            (0, w) => println!("Found {} warning{}.", w, plural(w)),
            (e, 0) => println!("Found {} error{}.", e, plural(e)),
            (e, w) => println!("Found {} error{}, {} warning{}.", e, plural(e), w, plural(w)),
        }

        if !strict && warning_count > 0 && error_count == 0 {
            println!("Hint: Run with --strict to treat warnings as errors.");
        }
    }

    if has_failures {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}
