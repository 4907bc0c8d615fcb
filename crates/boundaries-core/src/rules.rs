//! Feature rules: how a definition turns a raw shapefile feature into a
//! boundary name, identifier or slug, and whether the feature is kept at all.
//!
//! Rules are plain data so that a definition file stays declarative:
//!
//! ```toml
//! name_func = { attr = "WardName" }
//! id_func = { replace = { attr = "Ward", pattern = " / ", with = "/" } }
//! is_valid_func = { not_equals = { attr = "WARD", value = "0" } }
//! ```

use std::collections::{BTreeMap, HashMap};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Read access to the attributes of one shapefile feature.
pub trait Feature {
    fn get(&self, field: &str) -> Option<&str>;
}

impl Feature for HashMap<String, String> {
    fn get(&self, field: &str) -> Option<&str> {
        HashMap::get(self, field).map(String::as_str)
    }
}

impl Feature for BTreeMap<String, String> {
    fn get(&self, field: &str) -> Option<&str> {
        BTreeMap::get(self, field).map(String::as_str)
    }
}

/// Maps a feature to a single string value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRule {
    /// The value of one attribute.
    Attr(String),
    /// A fixed value, for single-boundary datasets.
    Constant(String),
    /// A regex substitution applied to one attribute.
    Replace {
        attr: String,
        pattern: String,
        with: String,
    },
    /// Sub-rules joined by a separator. Yields nothing if any part does.
    Concat {
        parts: Vec<FieldRule>,
        #[serde(default = "default_separator")]
        separator: String,
    },
}

fn default_separator() -> String {
    " ".to_string()
}

impl FieldRule {
    pub fn apply(&self, feature: &dyn Feature) -> Result<Option<String>, CoreError> {
        match self {
            FieldRule::Attr(field) => Ok(feature.get(field).map(str::to_string)),
            FieldRule::Constant(value) => Ok(Some(value.clone())),
            FieldRule::Replace {
                attr,
                pattern,
                with,
            } => {
                let re = compile(pattern)?;
                Ok(feature
                    .get(attr)
                    .map(|value| re.replace_all(value, with.as_str()).into_owned()))
            }
            FieldRule::Concat { parts, separator } => {
                let mut values = Vec::with_capacity(parts.len());
                for part in parts {
                    match part.apply(feature)? {
                        Some(value) => values.push(value),
                        None => return Ok(None),
                    }
                }
                Ok(Some(values.join(separator)))
            }
        }
    }

    /// Compile every pattern in the rule without applying it.
    pub fn check(&self) -> Result<(), CoreError> {
        match self {
            FieldRule::Attr(_) | FieldRule::Constant(_) => Ok(()),
            FieldRule::Replace { pattern, .. } => compile(pattern).map(|_| ()),
            FieldRule::Concat { parts, .. } => parts.iter().try_for_each(FieldRule::check),
        }
    }
}

/// Decides whether a feature becomes a boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidityRule {
    /// The attribute exists and is not blank.
    Present(String),
    Equals { attr: String, value: String },
    NotEquals { attr: String, value: String },
    Matches { attr: String, pattern: String },
}

impl ValidityRule {
    pub fn is_valid(&self, feature: &dyn Feature) -> Result<bool, CoreError> {
        Ok(match self {
            ValidityRule::Present(field) => feature
                .get(field)
                .is_some_and(|value| !value.trim().is_empty()),
            ValidityRule::Equals { attr, value } => feature.get(attr) == Some(value.as_str()),
            ValidityRule::NotEquals { attr, value } => feature.get(attr) != Some(value.as_str()),
            ValidityRule::Matches { attr, pattern } => {
                let re = compile(pattern)?;
                feature.get(attr).is_some_and(|value| re.is_match(value))
            }
        })
    }

    pub fn check(&self) -> Result<(), CoreError> {
        match self {
            ValidityRule::Matches { pattern, .. } => compile(pattern).map(|_| ()),
            _ => Ok(()),
        }
    }
}

fn compile(pattern: &str) -> Result<Regex, CoreError> {
    Regex::new(pattern).map_err(|source| CoreError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}
