// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with fuzzy match suggestions.
//!
//! Converts Figment deserialization errors into rich miette diagnostics
//! with source spans, valid key listings, and "did you mean?" suggestions
//! using Jaro-Winkler string similarity.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use std::fmt::Write as _;

use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity score to suggest a correction.
/// Catches typos like `print_erors` -> `print_errors` and
/// `databse_path` -> `database_path`.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with rich diagnostic information.
///
/// Each variant carries enough context for miette to render an Elm-style
/// error message with source spans, suggestions, and valid key listings.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// An unknown key was found in the configuration.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(barnacles::config::unknown_key),
        help("{}", format_unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        /// The unrecognized key name.
        key: String,
        /// Suggested correction via fuzzy matching, if any.
        suggestion: Option<String>,
        /// List of valid keys for the section.
        valid_keys: String,
        /// Source span for the offending key.
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        /// The source file content for context display.
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A configuration value has the wrong type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(
        code(barnacles::config::invalid_type),
        help("expected {expected}")
    )]
    InvalidType {
        /// The key with the wrong type.
        key: String,
        /// Description of the type mismatch.
        detail: String,
        /// What type was expected.
        expected: String,
        /// Source span for the offending value.
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        /// The source file content.
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value is not one of the accepted names (e.g. a raddec event type).
    #[error("invalid value `{value}` for key `{key}`")]
    #[diagnostic(
        code(barnacles::config::unknown_value),
        help("{}", format_unknown_value_help(suggestion.as_deref(), valid_values))
    )]
    UnknownValue {
        /// Dotted path of the key holding the value.
        key: String,
        /// The unrecognized value.
        value: String,
        /// Suggested correction via fuzzy matching, if any.
        suggestion: Option<String>,
        /// Accepted values for the key.
        valid_values: String,
    },

    /// A required configuration key is missing.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(barnacles::config::missing_key),
        help("add `{key} = <value>` to your barnacles.toml")
    )]
    MissingKey {
        /// The missing key name.
        key: String,
    },

    /// A validation error for a config value.
    #[error("validation error: {message}")]
    #[diagnostic(code(barnacles::config::validation))]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// Catch-all for other configuration errors.
    #[error("configuration error: {0}")]
    #[diagnostic(code(barnacles::config::other))]
    Other(String),
}

/// Format the help message for unknown key errors.
fn format_unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

fn format_unknown_value_help(suggestion: Option<&str>, valid_values: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Accepted values: {valid_values}"),
        None => format!("accepted values: {valid_values}"),
    }
}

/// Convert a `figment::Error` into a list of `ConfigError` diagnostics.
///
/// A figment error may carry several errors; each becomes one diagnostic.
/// Unknown keys and unknown enum values (such as a misspelled raddec event
/// name) get "did you mean" suggestions.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let (span, src) = key_label(&error, field, toml_sources);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: closest_match(field, expected),
                    valid_keys: expected.join(", "),
                    span,
                    src,
                }
            }
            Kind::UnknownVariant(value, expected) => ConfigError::UnknownValue {
                key: dotted_path(&error),
                value: value.clone(),
                suggestion: closest_match(value, expected),
                valid_values: expected.join(", "),
            },
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.clone().into_owned(),
            },
            Kind::InvalidType(actual, expected) => {
                let (span, src) = match error.path.last() {
                    Some(field) => key_label(&error, field, toml_sources),
                    None => (None, None),
                };
                ConfigError::InvalidType {
                    key: dotted_path(&error),
                    detail: format!("found {actual}, expected {expected}"),
                    expected: expected.to_string(),
                    span,
                    src,
                }
            }
            _ => ConfigError::Other(format!("{error}")),
        })
        .collect()
}

fn dotted_path(error: &figment::error::Error) -> String {
    error.path.join(".")
}

/// The path and text of the TOML file an error was read from, when known.
fn source_of<'a>(
    error: &figment::error::Error,
    toml_sources: &'a [(String, String)],
) -> Option<(&'a str, &'a str)> {
    let figment::Source::File(file) = error.metadata.as_ref()?.source.as_ref()? else {
        return None;
    };
    let file = file.display().to_string();
    toml_sources
        .iter()
        .find(|(name, _)| *name == file)
        .map(|(name, text)| (name.as_str(), text.as_str()))
}

/// Point a label at `field` inside the file the error came from.
fn key_label(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    source_of(error, toml_sources)
        .and_then(|(name, text)| {
            let offset = key_offset(text, &error.path, field)?;
            Some((
                SourceSpan::new(offset.into(), field.len()),
                NamedSource::new(name, text.to_string()),
            ))
        })
        .unzip()
}

/// Byte offset of a `field = ...` line declared directly in `table`.
///
/// `table` is the dotted header path (`["events", "raddec"]` for
/// `[events.raddec]`); an empty path means the root table. A trailing
/// element equal to `field` is ignored. Keys under other headers are skipped.
pub fn key_offset(content: &str, table: &[String], field: &str) -> Option<usize> {
    let table = match table.split_last() {
        Some((last, parent)) if last == field => parent,
        _ => table,
    };
    let wanted = table.join(".");

    let mut current = String::new();
    let mut line_start = 0;
    for line in content.split_inclusive('\n') {
        let start = line_start;
        line_start += line.len();

        let body = line.trim();
        if body.starts_with('[') {
            let header = body.trim_start_matches('[').split(']').next().unwrap_or_default();
            current = header.trim().to_string();
            continue;
        }
        if current != wanted {
            continue;
        }
        let declared = body.split_once('=').map(|(key, _)| key.trim());
        if declared == Some(field) {
            return Some(start + line.len() - line.trim_start().len());
        }
    }
    None
}

/// The accepted name closest to `unknown` by Jaro-Winkler similarity.
///
/// Returns `None` when nothing scores above the suggestion threshold.
pub fn closest_match(unknown: &str, choices: &[&str]) -> Option<String> {
    choices
        .iter()
        .map(|&choice| (strsim::jaro_winkler(unknown, choice), choice))
        .fold(None, |best: Option<(f64, &str)>, (score, choice)| match best {
            Some((top, _)) if top >= score => best,
            _ if score > SUGGESTION_THRESHOLD => Some((score, choice)),
            _ => best,
        })
        .map(|(_, choice)| choice.to_owned())
}

/// Print every diagnostic to stderr.
pub fn render_errors(errors: &[ConfigError]) {
    eprint!("{}", render_with(&GraphicalReportHandler::new(), errors));
}

fn render_with(handler: &GraphicalReportHandler, errors: &[ConfigError]) -> String {
    let mut report = String::new();
    for error in errors {
        let diagnostic: &dyn Diagnostic = error;
        if handler.render_report(&mut report, diagnostic).is_err() {
            let _ = writeln!(report, "error: {error}");
        }
    }
    report
}
