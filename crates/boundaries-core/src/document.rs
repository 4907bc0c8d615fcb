//! In-place edits of `definition.toml` that keep every other byte intact.

use std::path::Path;

use chrono::{Datelike, NaiveDate};
use toml_edit::{Date, Datetime, DocumentMut, Value};

use crate::CoreError;

/// A TOML local date. TOML only has four-digit years.
pub fn toml_date(date: NaiveDate) -> Result<Datetime, CoreError> {
    let year = u16::try_from(date.year())
        .ok()
        .filter(|year| *year <= 9999)
        .ok_or(CoreError::DateOutOfRange(date))?;
    Ok(Datetime {
        date: Some(Date {
            year,
            month: date.month() as u8,
            day: date.day() as u8,
        }),
        time: None,
        offset: None,
    })
}

/// Replace the `last_updated` date in definition source text.
///
/// Formatting, comments and key order are preserved, including the
/// whitespace and comments around the date value itself.
pub fn set_last_updated(source: &str, date: Datetime) -> Result<String, toml_edit::TomlError> {
    let mut doc: DocumentMut = source.parse()?;
    let replacement = Value::from(date);
    match doc.get_mut("last_updated").and_then(|item| item.as_value_mut()) {
        Some(value) => {
            let decor = value.decor().clone();
            *value = replacement;
            *value.decor_mut() = decor;
        }
        None => {
            doc.insert("last_updated", toml_edit::Item::Value(replacement));
        }
    }
    Ok(doc.to_string())
}

/// Rewrite the `last_updated` date of the definition file at `path`.
pub fn update_last_updated(path: &Path, date: NaiveDate) -> Result<(), CoreError> {
    let io = |source| CoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    let date = toml_date(date)?;
    let source = std::fs::read_to_string(path).map_err(io)?;
    let updated = set_last_updated(&source, date).map_err(|source| CoreError::Unparseable {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, updated).map_err(io)
}
