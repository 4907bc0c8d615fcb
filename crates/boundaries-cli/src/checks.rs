//! Offline and online checks of the catalog: definitions, licences and URLs.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use boundaries_core::licence::{LicenceCheck, check_licence, is_missing_template};
use boundaries_core::validate::check_definitions;
use boundaries_core::{LICENSE_FILE, Registry};
use boundaries_sync::Remote;
use tracing::debug;
use walkdir::WalkDir;

use crate::display::shown_url;

/// Print one line per definition problem. Returns the number printed.
pub fn definitions(registry: &Registry, out: &mut dyn Write) -> anyhow::Result<usize> {
    let diagnostics = check_definitions(registry);
    for diagnostic in &diagnostics {
        writeln!(out, "{diagnostic}")?;
    }
    Ok(diagnostics.len())
}

/// Report directories without a `LICENSE.txt` and licence texts that do not
/// match their recorded terms.
pub fn licenses(base: &Path, registry: &Registry, out: &mut dyn Write) -> anyhow::Result<usize> {
    let mut problems = 0;
    for dir in unlicensed_directories(base)? {
        writeln!(out, "{} No {LICENSE_FILE}", dir.display())?;
        problems += 1;
    }

    for entry in registry.iter() {
        let Some(url) = entry.definition.licence_url.as_deref() else {
            continue;
        };
        let dir = entry.directory();
        if is_missing_template(url) {
            writeln!(out, "{} No template for licence {url}", dir.display())?;
            problems += 1;
            continue;
        }
        let path = dir.join(LICENSE_FILE);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", path.display()));
            }
        };
        if check_licence(url, &text) == LicenceCheck::Mismatch {
            writeln!(out, "{} {LICENSE_FILE} does not match {url}", dir.display())?;
            problems += 1;
        }
    }
    Ok(problems)
}

/// Directories holding files but no licence. `.git` is skipped and
/// `.DS_Store` does not count as a file.
fn unlicensed_directories(base: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let walker = WalkDir::new(base)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");
    for dent in walker {
        let dent = dent?;
        if !dent.file_type().is_dir() {
            continue;
        }
        let mut has_files = false;
        let mut has_licence = false;
        for child in fs::read_dir(dent.path())
            .with_context(|| format!("listing {}", dent.path().display()))?
        {
            let child = child?;
            if child.file_type()?.is_dir() {
                continue;
            }
            match child.file_name().to_str() {
                Some(".DS_Store") => {}
                Some(LICENSE_FILE) => has_licence = true,
                _ => has_files = true,
            }
        }
        if has_files && !has_licence {
            out.push(dent.path().to_path_buf());
        }
    }
    Ok(out)
}

/// Print `<status> <url>` for every source, licence and data URL that does
/// not resolve.
pub async fn urls(registry: &Registry, remote: &Remote, out: &mut dyn Write) -> anyhow::Result<usize> {
    let mut problems = 0;
    for entry in registry.iter() {
        for (key, url) in entry.definition.urls().filter(|(_, url)| !url.is_empty()) {
            debug!(slug = %entry.slug, key, url, "checking");
            match remote.check(url).await {
                Ok(status) => {
                    if let Some(code) = status.code() {
                        writeln!(out, "{code} {}", shown_url(url))?;
                        problems += 1;
                    }
                }
                Err(err) => {
                    writeln!(out, "{} {err}", shown_url(url))?;
                    problems += 1;
                }
            }
        }
    }
    Ok(problems)
}
