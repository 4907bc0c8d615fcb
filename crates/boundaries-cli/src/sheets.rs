//! Tasks that compare the catalog with the tracking spreadsheet, or build
//! the national spreadsheet from census and Represent data.

use std::collections::HashSet;
use std::io::Write;

use anyhow::{Context, bail};
use boundaries_core::Registry;
use boundaries_core::reference::{
    MUNICIPAL_SUBDIVISIONS_WITHOUT_WARDS, REQUEST_AND_RECEIPT_HEADERS, SPREADSHEET_HEADERS,
};
use boundaries_sync::sheets::{parse_abbreviations, parse_census};
use boundaries_sync::{CensusRow, HttpClient, RepresentClient, TrackingSheet};
use tracing::info;

use crate::display::note_block;

const SHAPEFILE: &str = "Shapefile?";
const REQUEST_NOTES: &str = "Request notes";
const RESPONSE_NOTES: &str = "Response notes";

pub async fn fetch_sheet(http: &HttpClient, url: &str) -> anyhow::Result<TrackingSheet> {
    info!(url, "reading tracking spreadsheet");
    let text = http
        .get_text(url)
        .await
        .context("fetching the tracking spreadsheet")?;
    Ok(TrackingSheet::from_csv(&text)?)
}

/// Report catalog entries missing from the spreadsheet or not marked as
/// having a shapefile.
pub fn spreadsheet(registry: &Registry, sheet: &TrackingSheet, out: &mut dyn Write) -> anyhow::Result<usize> {
    let mut problems = 0;
    for entry in registry.iter() {
        let Some(code) = entry.definition.geographic_code() else {
            continue;
        };
        match sheet.row(code) {
            None => {
                writeln!(out, "{} ({code}) Not in spreadsheet", entry.slug)?;
                problems += 1;
            }
            Some(row) => {
                let value = row.get(SHAPEFILE).unwrap_or_default();
                if value != "Y" {
                    writeln!(
                        out,
                        "{} ({code}) Change \"{SHAPEFILE}\" from \"{value}\" to \"Y\"",
                        entry.slug
                    )?;
                    problems += 1;
                }
            }
        }
    }
    Ok(problems)
}

/// Print each entry's notes and spreadsheet revision notes. An outstanding
/// request note stops the run.
pub fn notes(registry: &Registry, sheet: &TrackingSheet, out: &mut dyn Write) -> anyhow::Result<()> {
    for entry in registry.iter() {
        let mut notes = Vec::new();
        if let Some(note) = entry.definition.notes.as_deref().filter(|n| !n.is_empty()) {
            notes.push(format!("Notes: {note}"));
        }
        if let Some(row) = entry
            .definition
            .geographic_code()
            .and_then(|code| sheet.row(code))
        {
            if row.get(REQUEST_NOTES).is_some() {
                bail!("{} has request notes", entry.slug);
            }
            if let Some(revision) = row.get(RESPONSE_NOTES) {
                notes.push(format!("Revision: {revision}"));
            }
        }
        if !notes.is_empty() {
            let source = entry.definition.source_url.as_deref();
            out.write_all(note_block(&entry.slug, source, &notes).as_bytes())?;
        }
    }
    Ok(())
}

pub struct NationalSources<'a> {
    pub census_url: &'a str,
    pub abbreviations_url: &'a str,
    pub represent_url: &'a str,
}

/// Write the national tracking spreadsheet as CSV.
pub async fn write_spreadsheet(
    registry: &Registry,
    http: &HttpClient,
    sources: &NationalSources<'_>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let abbreviations = parse_abbreviations(
        &http
            .get_text(sources.abbreviations_url)
            .await
            .context("fetching province abbreviations")?,
    )?;
    let data_urls = RepresentClient::new(http.clone(), sources.represent_url)
        .data_urls_by_geographic_code()
        .await
        .context("reading the Represent API")?;
    let census = parse_census(
        &http
            .get_text(sources.census_url)
            .await
            .context("fetching census subdivisions")?,
        &abbreviations,
    )?;

    let known: HashSet<&str> = registry
        .iter()
        .filter_map(|entry| entry.definition.geographic_code())
        .collect();

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(sheet_headers())?;
    for row in &census {
        let url = data_urls.get(&row.code).map(String::as_str).unwrap_or_default();
        writer.write_record(sheet_record(row, url, shapefile_status(&row.code, &known)))?;
    }
    writer.flush()?;
    Ok(())
}

fn sheet_headers() -> impl Iterator<Item = &'static str> {
    SPREADSHEET_HEADERS
        .iter()
        .chain(REQUEST_AND_RECEIPT_HEADERS)
        .copied()
}

/// One census row, with the request and receipt columns left blank.
fn sheet_record<'a>(row: &'a CensusRow, url: &'a str, status: &'static str) -> Vec<&'a str> {
    let mut record = vec![
        row.code.as_str(),
        row.name.as_str(),
        row.region.as_str(),
        row.population.as_str(),
        url,
        status,
    ];
    record.resize(record.len() + REQUEST_AND_RECEIPT_HEADERS.len(), "");
    record
}

/// `Y` when the catalog has the subdivision, `N` when it is known to have no
/// wards, blank otherwise.
fn shapefile_status(code: &str, known: &HashSet<&str>) -> &'static str {
    if known.contains(code) {
        "Y"
    } else if MUNICIPAL_SUBDIVISIONS_WITHOUT_WARDS.contains(&code) {
        "N"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SHEET: &str = "\
OCD,Geographic name,Province or territory,Population,URL,Shapefile?,Contact,Request notes,Response notes
3530027,Wellesley,ON,10713,,Y,,,
1310032,Fredericton,NB,56224,,N,,,Awaiting 2016 wards
";

    fn catalog(entries: &[(&str, &str, Option<&str>)]) -> (TempDir, Registry) {
        let tmp = TempDir::new().unwrap();
        for (name, code, notes) in entries {
            let dir = tmp.path().join(name.to_lowercase().replace(' ', "-"));
            fs::create_dir_all(&dir).unwrap();
            let mut source = format!(
                "name = \"{name}\"\ndomain = \"Somewhere, ON\"\nlast_updated = 2014-01-01\nsource_url = \"http://example.com/{code}\"\n"
            );
            if let Some(notes) = notes {
                source.push_str(&format!("notes = \"{notes}\"\n"));
            }
            source.push_str(&format!("\n[metadata]\ngeographic_code = \"{code}\"\n"));
            fs::write(dir.join("definition.toml"), source).unwrap();
        }
        let registry = Registry::load(tmp.path()).unwrap();
        (tmp, registry)
    }

    #[test]
    fn spreadsheet_reports_missing_and_unmarked_rows() {
        let (_tmp, registry) = catalog(&[
            ("Wellesley wards", "3530027", None),
            ("Fredericton wards", "1310032", None),
            ("Brantford wards", "3529006", None),
        ]);
        let sheet = TrackingSheet::from_csv(SHEET).unwrap();
        let mut out: Vec<u8> = Vec::new();
        assert_eq!(spreadsheet(&registry, &sheet, &mut out).unwrap(), 2);
        let out = String::from_utf8(out).unwrap();
        assert_eq!(
            out,
            "brantford-wards (3529006) Not in spreadsheet\n\
             fredericton-wards (1310032) Change \"Shapefile?\" from \"N\" to \"Y\"\n"
        );
    }

    #[test]
    fn notes_include_revisions() {
        let (_tmp, registry) = catalog(&[
            ("Wellesley wards", "3530027", None),
            ("Fredericton wards", "1310032", Some("Ward 12 corrected by hand.")),
        ]);
        let sheet = TrackingSheet::from_csv(SHEET).unwrap();
        let mut out: Vec<u8> = Vec::new();
        notes(&registry, &sheet, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "fredericton-wards\nSource: http://example.com/1310032\nNotes: Ward 12 corrected by hand.\nRevision: Awaiting 2016 wards\n\n"
        );
    }

    #[test]
    fn request_notes_stop_the_run() {
        let (_tmp, registry) = catalog(&[("Brantford wards", "3529006", None)]);
        let sheet = TrackingSheet::from_csv(
            "OCD,Shapefile?,Request notes,Response notes\n3529006,Y,Asked twice,\n",
        )
        .unwrap();
        let err = notes(&registry, &sheet, &mut Vec::<u8>::new()).unwrap_err();
        assert_eq!(err.to_string(), "brantford-wards has request notes");
    }

    #[test]
    fn shapefile_column() {
        let known: HashSet<&str> = ["3530027"].into_iter().collect();
        assert_eq!(shapefile_status("3530027", &known), "Y");
        assert_eq!(shapefile_status("1001542", &known), "N");
        assert_eq!(shapefile_status("3529006", &known), "");
    }

    #[test]
    fn sheet_rows_carry_request_and_receipt_columns() {
        let headers: Vec<_> = sheet_headers().collect();
        assert_eq!(headers[5], "Shapefile?");
        assert_eq!(headers.last(), Some(&"Response notes"));

        let row = CensusRow {
            code: "3530027".into(),
            name: "Wellesley".into(),
            region: "ON".into(),
            population: "10713".into(),
        };
        let record = sheet_record(&row, "https://represent.opennorth.ca/boundaries/wellesley-wards/", "Y");
        assert_eq!(record.len(), headers.len());
        assert_eq!(record[..6], ["3530027", "Wellesley", "ON", "10713", "https://represent.opennorth.ca/boundaries/wellesley-wards/", "Y"]);
        assert!(record[6..].iter().all(|cell| cell.is_empty()));
    }
}
