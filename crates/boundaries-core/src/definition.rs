//! The per-jurisdiction definition record read from `definition.toml`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::rules::{FieldRule, ValidityRule};

/// File name of a definition inside a jurisdiction directory.
pub const DEFINITION_FILE: &str = "definition.toml";

/// File name of the licence text inside a jurisdiction directory.
pub const LICENSE_FILE: &str = "LICENSE.txt";

/// How to interpret one boundary dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    #[serde(default)]
    pub singular: Option<String>,
    pub domain: String,
    #[serde(deserialize_with = "toml_date")]
    pub last_updated: NaiveDate,
    #[serde(default)]
    pub slug_func: Option<FieldRule>,
    #[serde(default)]
    pub name_func: Option<FieldRule>,
    #[serde(default)]
    pub id_func: Option<FieldRule>,
    #[serde(default)]
    pub is_valid_func: Option<ValidityRule>,
    #[serde(default)]
    pub authority: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub licence_url: Option<String>,
    #[serde(default)]
    pub data_url: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Extra `ogr2ogr` arguments applied after normalization.
    #[serde(default)]
    pub ogr2ogr: Option<String>,
    #[serde(default)]
    pub prj: Option<String>,
    #[serde(default)]
    pub skip_crc32: bool,
}

impl Definition {
    /// The Statistics Canada geographic code, from `metadata` or from a
    /// census-subdivision `division_id` in `extra`.
    pub fn geographic_code(&self) -> Option<&str> {
        if let Some(code) = self.metadata.get("geographic_code") {
            if !code.is_empty() {
                return Some(code);
            }
        }
        self.division_id()
            .and_then(|id| id.rsplit_once("/csd:"))
            .map(|(_, code)| code)
            .filter(|code| !code.is_empty())
    }

    pub fn division_id(&self) -> Option<&str> {
        self.extra.get("division_id").map(String::as_str)
    }

    /// Declared URLs in the order `source_url`, `licence_url`, `data_url`.
    pub fn urls(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("source_url", &self.source_url),
            ("licence_url", &self.licence_url),
            ("data_url", &self.data_url),
        ]
        .into_iter()
        .filter_map(|(key, url)| url.as_deref().map(|u| (key, u)))
    }
}

fn toml_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    use serde::de::Error;

    let datetime = toml::value::Datetime::deserialize(deserializer)?;
    let date = datetime
        .date
        .ok_or_else(|| D::Error::custom("expected a date such as 2015-01-06"))?;
    NaiveDate::from_ymd_opt(date.year.into(), date.month.into(), date.day.into())
        .ok_or_else(|| D::Error::custom(format!("invalid calendar date {date}")))
}
