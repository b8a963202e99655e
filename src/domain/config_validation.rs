//! Configuration validation.
//!
//! Validates every stream section before any data file is opened, so a bad
//! reference fails fast instead of after the primary has started streaming.

use crate::domain::error::PriceStreamError;
use crate::domain::source::{Frequency, ParseFrequencyError};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::collections::HashSet;

pub const DATA_SECTION: &str = "data";
pub const PRIMARY_SECTION: &str = "primary";
pub const PIPELINE_SECTION: &str = "pipeline";

pub fn validate_pipeline_config(config: &dyn ConfigPort) -> Result<(), PriceStreamError> {
    validate_extension(config)?;
    validate_source_section(config, PRIMARY_SECTION)?;
    for section in reference_sections(config)? {
        validate_source_section(config, &section)?;
    }
    Ok(())
}

/// Section names listed in `[pipeline] references`, in order.
///
/// Names are lowercased to match how section headers are stored. Empty
/// tokens, duplicates, and names without a matching section are rejected.
pub fn reference_sections(config: &dyn ConfigPort) -> Result<Vec<String>, PriceStreamError> {
    let Some(list) = non_empty(config.get_string(PIPELINE_SECTION, "references")) else {
        return Ok(Vec::new());
    };

    let mut sections = Vec::new();
    let mut seen = HashSet::new();
    for token in list.split(',') {
        let name = token.trim().to_lowercase();
        if name.is_empty() {
            return Err(PriceStreamError::config_invalid(
                PIPELINE_SECTION,
                "references",
                "empty section name in list",
            ));
        }
        if name == PRIMARY_SECTION {
            return Err(PriceStreamError::config_invalid(
                PIPELINE_SECTION,
                "references",
                "the primary section cannot also be a reference",
            ));
        }
        if !seen.insert(name.clone()) {
            return Err(PriceStreamError::config_invalid(
                PIPELINE_SECTION,
                "references",
                format!("duplicate section {name}"),
            ));
        }
        if !config.has_section(&name) {
            return Err(PriceStreamError::config_invalid(
                PIPELINE_SECTION,
                "references",
                format!("no [{name}] section"),
            ));
        }
        sections.push(name);
    }
    Ok(sections)
}

fn validate_extension(config: &dyn ConfigPort) -> Result<(), PriceStreamError> {
    match config.get_string(DATA_SECTION, "extension") {
        Some(ext) if ext.trim().is_empty() || ext.contains(['/', '\\']) => {
            Err(PriceStreamError::config_invalid(
                DATA_SECTION,
                "extension",
                "extension must be a non-empty file suffix",
            ))
        }
        _ => Ok(()),
    }
}

fn validate_source_section(config: &dyn ConfigPort, section: &str) -> Result<(), PriceStreamError> {
    if non_empty(config.get_string(section, "ticker")).is_none() {
        return Err(PriceStreamError::config_missing(section, "ticker"));
    }

    let start = parse_date(config.get_string(section, "start").as_deref(), section, "start")?;
    let end = parse_date(config.get_string(section, "end").as_deref(), section, "end")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(PriceStreamError::config_invalid(
                section,
                "start",
                "start must not be after end",
            ));
        }
    }

    parse_frequency(config.get_string(section, "freq").as_deref(), section)?;
    parse_bool(
        config.get_string(section, "flush_partial").as_deref(),
        section,
        "flush_partial",
    )?;
    Ok(())
}

/// Parses an optional `YYYY-MM-DD` value; blank counts as absent.
pub fn parse_date(
    value: Option<&str>,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, PriceStreamError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                PriceStreamError::config_invalid(
                    section,
                    key,
                    format!("invalid {key} format, expected YYYY-MM-DD"),
                )
            }),
    }
}

/// Parses an optional frequency; absent means daily.
pub fn parse_frequency(value: Option<&str>, section: &str) -> Result<Frequency, PriceStreamError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(Frequency::default()),
        Some(s) => s.parse().map_err(|e: ParseFrequencyError| {
            PriceStreamError::config_invalid(section, "freq", e.to_string())
        }),
    }
}

/// Parses an optional boolean; absent means false.
pub fn parse_bool(value: Option<&str>, section: &str, key: &str) -> Result<bool, PriceStreamError> {
    match value.map(|s| s.trim().to_lowercase()).as_deref() {
        None | Some("") => Ok(false),
        Some("true" | "yes" | "1") => Ok(true),
        Some("false" | "no" | "0") => Ok(false),
        Some(other) => Err(PriceStreamError::config_invalid(
            section,
            key,
            format!("expected true or false, got {other:?}"),
        )),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
