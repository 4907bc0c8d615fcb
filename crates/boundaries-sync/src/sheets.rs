//! CSV inputs: the tracking spreadsheet, the province abbreviation mapping
//! and the census subdivision listing.

use std::collections::HashMap;
use std::sync::LazyLock;

use csv::{ReaderBuilder, StringRecord};
use regex::Regex;
use tracing::debug;

use crate::SyncError;

static GEOGRAPHIC_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+) \((.+)\)$").expect("static pattern"));

/// The tracking spreadsheet, keyed by its first column (the geographic code).
#[derive(Debug, Clone, Default)]
pub struct TrackingSheet {
    headers: StringRecord,
    rows: HashMap<String, StringRecord>,
}

/// One spreadsheet row with columns addressed by header name.
#[derive(Debug, Clone, Copy)]
pub struct SheetRow<'a> {
    headers: &'a StringRecord,
    record: &'a StringRecord,
}

impl<'a> SheetRow<'a> {
    /// The trimmed cell under `header`, if the column exists and is non-empty.
    pub fn get(&self, header: &str) -> Option<&'a str> {
        let index = self.headers.iter().position(|h| h.trim() == header)?;
        self.record
            .get(index)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

impl TrackingSheet {
    pub fn from_csv(text: &str) -> Result<Self, SyncError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());
        let headers = reader.headers()?.clone();
        let mut rows = HashMap::new();
        for record in reader.records() {
            let record = record?;
            if let Some(key) = record.get(0).map(str::trim).filter(|k| !k.is_empty()) {
                rows.insert(key.to_string(), record);
            }
        }
        debug!(rows = rows.len(), "read tracking spreadsheet");
        Ok(Self { headers, rows })
    }

    pub fn row(&self, key: &str) -> Option<SheetRow<'_>> {
        self.rows.get(key).map(|record| SheetRow {
            headers: &self.headers,
            record,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Second column of the OCD province and territory mapping.
pub fn parse_abbreviations(text: &str) -> Result<Vec<String>, SyncError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut out = Vec::new();
    for record in reader.records() {
        if let Some(abbreviation) = record?.get(1) {
            out.push(abbreviation.trim().to_string());
        }
    }
    Ok(out)
}

/// One census subdivision (or the national total).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CensusRow {
    pub code: String,
    pub name: String,
    pub region: String,
    pub population: String,
}

/// Parse the census listing: a title line, a header line, then data rows up
/// to the first blank line. Names look like `Wellesley (ON)`; the national
/// row is plain `Canada`.
pub fn parse_census(text: &str, abbreviations: &[String]) -> Result<Vec<CensusRow>, SyncError> {
    let table: Vec<&str> = text
        .lines()
        .skip(2)
        .take_while(|line| !line.trim().trim_matches(',').is_empty())
        .collect();
    let joined = table.join("\n");
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(joined.as_bytes());

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |i: usize| record.get(i).unwrap_or_default().trim().to_string();
        let full_name = field(1);
        let (name, region) = match GEOGRAPHIC_NAME.captures(&full_name) {
            Some(caps) => {
                let region = caps[2].to_string();
                if !abbreviations.contains(&region) {
                    return Err(SyncError::UnrecognizedRegion {
                        region,
                        name: full_name.clone(),
                    });
                }
                (caps[1].to_string(), region)
            }
            None if full_name == "Canada" => ("Canada".to_string(), "Canada".to_string()),
            None => return Err(SyncError::UnrecognizedName(full_name.clone())),
        };
        out.push(CensusRow {
            code: field(0),
            name,
            region,
            population: field(4),
        });
    }
    debug!(rows = out.len(), "read census subdivisions");
    Ok(out)
}
