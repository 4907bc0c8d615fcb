//! Checks on loaded definitions. Each problem becomes one [`Diagnostic`];
//! nothing here fails the run.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::reference::{
    NO_GEOGRAPHIC_CODE, SHARED_AUTHORITIES, VALID_ENCODINGS, VALID_EXTRA_KEYS, VALID_KEYS,
    is_valid_domain,
};
use crate::registry::{Entry, Registry};

static DIVISION_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ocd-division/country:ca(/[a-z_]+:[^/\s]+)*$").expect("static pattern")
});

/// One problem found in one jurisdiction directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub directory: PathBuf,
    pub message: String,
}

impl Diagnostic {
    pub fn new(directory: &Path, message: impl Into<String>) -> Self {
        Self {
            directory: directory.to_path_buf(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.directory.display(), self.message)
    }
}

/// Run every definition check over the registry.
pub fn check_definitions(registry: &Registry) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for entry in registry.iter() {
        out.extend(check_entry(entry));
    }
    out.extend(check_shared_data_urls(registry));
    debug!(count = out.len(), "definition checks complete");
    out
}

/// Checks that only need the entry itself.
pub fn check_entry(entry: &Entry) -> Vec<Diagnostic> {
    let dir = entry.directory();
    let def = &entry.definition;
    let mut out = Vec::new();

    let mut unknown: Vec<&str> = entry
        .table
        .keys()
        .map(String::as_str)
        .filter(|key| !VALID_KEYS.contains(key))
        .collect();
    unknown.sort_unstable();
    if !unknown.is_empty() {
        out.push(Diagnostic::new(
            dir,
            format!("Unrecognized key: {}", unknown.join(", ")),
        ));
    }

    let unknown_extra: Vec<&str> = def
        .extra
        .keys()
        .map(String::as_str)
        .filter(|key| !VALID_EXTRA_KEYS.contains(key))
        .collect();
    if !unknown_extra.is_empty() {
        out.push(Diagnostic::new(
            dir,
            format!("Unrecognized extra key: {}", unknown_extra.join(", ")),
        ));
    }

    let values: Vec<&str> = entry
        .table
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "metadata" | "extra"))
        .filter_map(|(_, value)| value.as_str())
        .collect();
    let distinct: HashSet<&str> = values.iter().copied().collect();
    if distinct.len() < values.len() {
        out.push(Diagnostic::new(dir, "Non-unique values"));
    }

    if !NO_GEOGRAPHIC_CODE.contains(&def.name.as_str()) && def.geographic_code().is_none() {
        out.push(Diagnostic::new(dir, "Missing geographic code"));
    }

    for (key, value) in &entry.table {
        if is_empty(value) {
            out.push(Diagnostic::new(dir, format!("Empty value for {key}")));
        }
    }

    if !def.domain.is_empty() && !is_valid_domain(&def.domain) {
        out.push(Diagnostic::new(
            dir,
            format!("Unrecognized domain: {}", def.domain),
        ));
    }

    if let Some(encoding) = def.encoding.as_deref() {
        if !encoding.is_empty() && !VALID_ENCODINGS.contains(&encoding) {
            out.push(Diagnostic::new(
                dir,
                format!("Unrecognized encoding: {encoding}"),
            ));
        }
    }

    if let Some(id) = def.division_id() {
        if !DIVISION_ID.is_match(id) {
            out.push(Diagnostic::new(dir, format!("Invalid division_id: {id}")));
        }
    }

    let rules = [
        ("slug_func", def.slug_func.as_ref().map(|r| r.check())),
        ("name_func", def.name_func.as_ref().map(|r| r.check())),
        ("id_func", def.id_func.as_ref().map(|r| r.check())),
        ("is_valid_func", def.is_valid_func.as_ref().map(|r| r.check())),
    ];
    for (key, result) in rules {
        if let Some(Err(err)) = result {
            out.push(Diagnostic::new(dir, format!("Invalid {key}: {err}")));
        }
    }

    if !ends_in_single_newline(&entry.source) {
        out.push(Diagnostic::new(dir, "Ends in zero or multiple newlines"));
    }

    out
}

/// Two definitions may only share a `data_url` when the authority publishes
/// one dataset for several jurisdictions.
pub fn check_shared_data_urls(registry: &Registry) -> Vec<Diagnostic> {
    let mut by_url: BTreeMap<&str, Vec<&Entry>> = BTreeMap::new();
    for entry in registry.iter() {
        if let Some(url) = entry.definition.data_url.as_deref() {
            by_url.entry(url).or_default().push(entry);
        }
    }
    let mut out = Vec::new();
    for entries in by_url.values().filter(|entries| entries.len() > 1) {
        for entry in entries {
            let shared_ok = entry
                .definition
                .authority
                .as_deref()
                .is_some_and(|authority| SHARED_AUTHORITIES.contains(&authority));
            if !shared_ok {
                let others: Vec<&str> = entries
                    .iter()
                    .filter(|other| other.slug != entry.slug)
                    .map(|other| other.slug.as_str())
                    .collect();
                out.push(Diagnostic::new(
                    entry.directory(),
                    format!("Shared data_url with {}", others.join(", ")),
                ));
            }
        }
    }
    out
}

fn is_empty(value: &toml::Value) -> bool {
    match value {
        toml::Value::String(s) => s.trim().is_empty(),
        toml::Value::Table(t) => t.is_empty(),
        toml::Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

fn ends_in_single_newline(source: &str) -> bool {
    source
        .strip_suffix('\n')
        .and_then(|rest| rest.chars().last())
        .is_some_and(|c| !c.is_whitespace())
}
