//! The update pipeline: probe each data URL, download what changed,
//! normalize it to one shapefile and record the update.

use std::io::Write;

use anyhow::Context;
use boundaries_core::reference::NO_UPDATE;
use boundaries_core::{Entry, Registry};
use boundaries_store::{GeoTool, Normalizer, StagedFormat, StateUpdater, VersionControl, clean_directory};
use boundaries_sync::{Freshness, Remote};
use tracing::{debug, info, warn};

use crate::display::failure;

/// What happened to one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    UpToDate,
    LocalAhead,
    Updated,
    /// A download or conversion problem, already reported.
    Failed,
}

pub struct Pipeline<'a, G: GeoTool, V: VersionControl> {
    remote: &'a Remote,
    tool: &'a G,
    vcs: &'a V,
}

impl<'a, G: GeoTool, V: VersionControl> Pipeline<'a, G, V> {
    pub fn new(remote: &'a Remote, tool: &'a G, vcs: &'a V) -> Self {
        Self { remote, tool, vcs }
    }

    /// Update every entry with a data URL, or only `only` when given.
    /// Per-entry failures are printed and the run continues; index and
    /// definition failures stop it.
    pub async fn run(
        &self,
        registry: &Registry,
        only: Option<&str>,
        out: &mut dyn Write,
    ) -> anyhow::Result<Vec<(String, Outcome)>> {
        if let Some(slug) = only {
            if registry.get(slug).is_none() {
                anyhow::bail!("no definition with slug {slug}");
            }
        }
        let mut outcomes = Vec::new();
        for entry in registry.iter() {
            if only.is_some_and(|slug| slug != entry.slug) {
                continue;
            }
            let Some(url) = entry.definition.data_url.as_deref().filter(|u| !u.is_empty()) else {
                continue;
            };
            if NO_UPDATE.contains(&url) {
                debug!(slug = %entry.slug, "excluded from automatic updates");
                continue;
            }
            let outcome = self.update(entry, url, out).await?;
            outcomes.push((entry.slug.clone(), outcome));
        }
        Ok(outcomes)
    }

    pub async fn update(&self, entry: &Entry, url: &str, out: &mut dyn Write) -> anyhow::Result<Outcome> {
        let dir = entry.directory();
        let probe = match self.remote.probe(url).await {
            Ok(probe) => probe,
            Err(err) => return report(out, entry, url, &err),
        };

        match Freshness::classify(entry.definition.last_updated, probe.modified) {
            Freshness::UpToDate => {
                debug!(slug = %entry.slug, "up to date");
                return Ok(Outcome::UpToDate);
            }
            Freshness::LocalAhead => {
                warn!(slug = %entry.slug, local = %entry.definition.last_updated, remote = %probe.modified, "local date is ahead of the source");
                writeln!(out, "{} is more recent than the source\n", entry.slug)?;
                return Ok(Outcome::LocalAhead);
            }
            Freshness::Stale => {}
        }

        let format = StagedFormat::from_extension(probe.extension.as_deref());
        let extension = match format.extension() {
            Ok(extension) => extension,
            Err(err) => return report(out, entry, url, &err),
        };
        info!(slug = %entry.slug, remote = %probe.modified, format = %format, "updating");
        let staged = match self.remote.fetch(url, extension, dir).await {
            Ok(staged) => staged,
            Err(err) => return report(out, entry, url, &err),
        };
        let staged_name = staged
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();

        let removed = match clean_directory(dir, staged_name) {
            Ok(removed) => removed,
            Err(err) => return report(out, entry, url, &err),
        };
        let updater = StateUpdater::new(self.vcs);
        updater
            .stage_removals(&removed)
            .with_context(|| format!("staging removals in {}", dir.display()))?;

        let files = match Normalizer::new(self.tool, dir).run(&format, entry.definition.ogr2ogr.as_deref()) {
            Ok(files) => files,
            Err(err) => return report(out, entry, url, &err),
        };
        let notes = updater
            .record(entry, &files, probe.modified)
            .with_context(|| format!("recording the update of {}", entry.slug))?;
        if let Some(notes) = notes {
            writeln!(out, "{}\n{notes}\n", entry.slug)?;
        }
        Ok(Outcome::Updated)
    }
}

fn report(
    out: &mut dyn Write,
    entry: &Entry,
    url: &str,
    err: &dyn std::fmt::Display,
) -> anyhow::Result<Outcome> {
    warn!(slug = %entry.slug, error = %err, "update failed");
    out.write_all(failure(&entry.slug, url, err).as_bytes())?;
    Ok(Outcome::Failed)
}
