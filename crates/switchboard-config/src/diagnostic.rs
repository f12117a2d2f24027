// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment reports deserialization failures without positions. This module
//! maps them onto miette diagnostics that point into the TOML file and, for
//! misspelled keys, offer the closest valid key.

#![allow(unused_assignments)] // emitted by the miette derive

use figment::error::Kind;
use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Keys scoring below this Jaro-Winkler similarity are not suggested.
const MIN_SIMILARITY: f64 = 0.75;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("`{key}` is not a recognized setting")]
    #[diagnostic(
        code(switchboard::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Closest valid key, when one is similar enough.
        suggestion: Option<String>,
        valid_keys: String,
        #[label("unrecognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type ({detail})")]
    #[diagnostic(code(switchboard::config::invalid_type), help("use a value of type {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    #[error("`{key}` is required")]
    #[diagnostic(
        code(switchboard::config::missing_key),
        help("set `{key}` in switchboard.toml or via its SWITCHBOARD_ environment variable")
    )]
    MissingKey { key: String },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(switchboard::config::validation))]
    Validation { message: String },

    #[error("could not load configuration: {0}")]
    #[diagnostic(code(switchboard::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    let listing = format!("this section accepts: {valid_keys}");
    match suggestion {
        Some(key) => format!("did you mean `{key}`? {listing}"),
        None => listing,
    }
}

/// Translate every error figment collected into a diagnostic.
///
/// `sources` holds `(name, content)` for each TOML document that was merged,
/// so unknown keys can be underlined in place.
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| diagnose(&error, sources))
        .collect()
}

fn diagnose(error: &figment::Error, sources: &[(String, String)]) -> ConfigError {
    match &error.kind {
        Kind::UnknownField(field, expected) => {
            let located = source_for(error, sources).and_then(|(name, content)| {
                let offset = locate_key(content, error.path.first().map(String::as_str), field)?;
                Some((
                    SourceSpan::new(offset.into(), field.len()),
                    NamedSource::new(name, content.clone()),
                ))
            });
            let (span, src) = located.unzip();
            ConfigError::UnknownKey {
                key: field.clone(),
                suggestion: suggest_key(field, *expected),
                valid_keys: expected.join(", "),
                span,
                src,
            }
        }
        Kind::MissingField(field) => ConfigError::MissingKey {
            key: dotted(&error.path, Some(field.as_ref())),
        },
        Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
            key: dotted(&error.path, None),
            detail: format!("got {actual}"),
            expected: expected.clone(),
        },
        _ => ConfigError::Other(error.to_string()),
    }
}

fn dotted(path: &[String], leaf: Option<&str>) -> String {
    path.iter()
        .map(String::as_str)
        .chain(leaf)
        .collect::<Vec<_>>()
        .join(".")
}

/// Pick the TOML document an error came from. Inline documents carry no
/// file metadata, so a lone source is assumed to be the culprit.
fn source_for<'a>(
    error: &figment::Error,
    sources: &'a [(String, String)],
) -> Option<&'a (String, String)> {
    let file = error
        .metadata
        .as_ref()
        .and_then(|meta| meta.source.as_ref())
        .and_then(|source| source.file_path())
        .map(|path| path.display().to_string());

    match file {
        Some(file) => sources.iter().find(|(name, _)| *name == file),
        None if sources.len() == 1 => sources.first(),
        None => None,
    }
}

/// Byte offset of `field` as a key inside `[section]`, or at top level when
/// `section` is `None`. The search stops at the next table header.
pub fn locate_key(content: &str, section: Option<&str>, field: &str) -> Option<usize> {
    let mut in_section = section.is_none();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let body = line.trim_start();
        let indent = line.len() - body.len();

        if body.starts_with('[') {
            let name = body.trim_end().trim_start_matches('[').trim_end_matches(']');
            in_section = section == Some(name.trim());
        } else if in_section {
            let is_key = body
                .strip_prefix(field)
                .map(|rest| rest.trim_start().starts_with('='))
                .unwrap_or(false);
            if is_key {
                return Some(offset + indent);
            }
        }
        offset += line.len();
    }

    None
}

/// Closest valid key to `unknown`, if any is similar enough.
pub fn suggest_key<S: AsRef<str>>(unknown: &str, valid_keys: &[S]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key.as_ref()), key.as_ref()))
        .filter(|(score, _)| *score > MIN_SIMILARITY)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Print each error to stderr as a graphical miette report.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}
