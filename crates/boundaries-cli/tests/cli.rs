use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const WATERLOO_LICENCE: &str = "http://www.regionofwaterloo.ca/en/regionalGovernment/OpenDataLicence.asp";

fn cmd() -> Command {
    Command::cargo_bin("boundaries").unwrap()
}

fn write_definition(base: &Path, dir: &str, body: &str) {
    let dir = base.join(dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("definition.toml"), body).unwrap();
}

fn wellesley(base: &Path) {
    write_definition(
        base,
        "on/wellesley",
        &format!(
            r#"name = "Wellesley wards"
domain = "Wellesley, ON"
last_updated = 2015-01-06
authority = "Regional Municipality of Waterloo"
licence_url = "{WATERLOO_LICENCE}"
data_url = "http://www.regionofwaterloo.ca/opendatadownloads/WardBoundaries.zip"

[metadata]
geographic_code = "3530027"
"#
        ),
    );
    fs::write(
        base.join("on/wellesley/LICENSE.txt"),
        "I. Terms of Use. Contains information provided by the Regional Municipality of Waterloo under licence (http://www.regionofwaterloo.ca/en/regionalGovernment/OpenDataLicence.asp).\n",
    )
    .unwrap();
}

#[test]
fn clean_catalog_has_no_definition_problems() {
    let tmp = TempDir::new().unwrap();
    wellesley(tmp.path());

    cmd()
        .args(["--base", tmp.path().to_str().unwrap(), "definitions"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn definition_problems_go_to_stdout() {
    let tmp = TempDir::new().unwrap();
    wellesley(tmp.path());
    write_definition(
        tmp.path(),
        "nb/fredericton",
        "name = \"Fredericton wards\"\ndomain = \"Fredericton, NB\"\nlast_updated = 2012-05-14\nencoding = \"utf-8\"\n\n",
    );

    cmd()
        .env("BOUNDARIES_BASE", tmp.path())
        .arg("definitions")
        .assert()
        .success()
        .stdout(contains("Unrecognized encoding: utf-8"))
        .stdout(contains("Missing geographic code"))
        .stdout(contains("Ends in zero or multiple newlines"))
        .stdout(contains("wellesley").not());
}

#[test]
fn licence_problems_are_reported() {
    let tmp = TempDir::new().unwrap();
    wellesley(tmp.path());
    fs::create_dir_all(tmp.path().join("on/woolwich")).unwrap();
    fs::write(tmp.path().join("on/woolwich/wards.shp"), "").unwrap();

    cmd()
        .args(["--base", tmp.path().to_str().unwrap(), "licenses"])
        .assert()
        .success()
        .stdout(contains("woolwich No LICENSE.txt"))
        .stdout(contains("wellesley").not());
}

#[test]
fn duplicate_slugs_stop_the_run() {
    let tmp = TempDir::new().unwrap();
    wellesley(tmp.path());
    write_definition(
        tmp.path(),
        "on/wellesley-copy",
        "name = \"Wellesley wards\"\ndomain = \"Wellesley, ON\"\nlast_updated = 2015-01-06\n",
    );

    cmd()
        .args(["--base", tmp.path().to_str().unwrap(), "definitions"])
        .assert()
        .failure()
        .stderr(contains("wellesley-wards"));
}

#[test]
fn malformed_definition_stops_the_run() {
    let tmp = TempDir::new().unwrap();
    write_definition(tmp.path(), "on/broken", "name = \"Broken wards\"\ndomain = \n");

    cmd()
        .args(["--base", tmp.path().to_str().unwrap(), "licenses"])
        .assert()
        .failure()
        .stderr(contains("loading definitions"));
}

#[test]
fn unknown_slug_for_shapefiles_fails() {
    let tmp = TempDir::new().unwrap();
    wellesley(tmp.path());

    cmd()
        .args(["--base", tmp.path().to_str().unwrap(), "shapefiles", "--only", "nowhere"])
        .assert()
        .failure()
        .stderr(contains("no definition with slug nowhere"));
}

#[test]
fn help_lists_every_task() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("definitions"))
        .stdout(contains("licenses"))
        .stdout(contains("urls"))
        .stdout(contains("spreadsheet"))
        .stdout(contains("notes"))
        .stdout(contains("write-spreadsheet"))
        .stdout(contains("shapefiles"));
}
