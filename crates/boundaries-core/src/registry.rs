//! Discovery and loading of every `definition.toml` under a catalog root.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::definition::{DEFINITION_FILE, Definition};
use crate::CoreError;

/// One loaded definition and where it came from.
#[derive(Debug, Clone)]
pub struct Entry {
    pub slug: String,
    pub definition: Definition,
    /// Every top-level key of the file, including ones `Definition` ignores.
    pub table: toml::Table,
    /// Raw file contents, for checks on formatting.
    pub source: String,
    pub file: PathBuf,
}

impl Entry {
    /// The jurisdiction directory holding the definition.
    pub fn directory(&self) -> &Path {
        self.file.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// All definitions in a catalog, keyed and ordered by slug.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: BTreeMap<String, Entry>,
}

impl Registry {
    /// Load every definition beneath `base`.
    ///
    /// Fails on the first malformed definition or duplicate slug.
    pub fn load(base: &Path) -> Result<Self, CoreError> {
        let mut registry = Registry::default();
        let walker = WalkDir::new(base)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e));
        for dent in walker {
            let dent = dent?;
            if dent.file_type().is_file() && dent.file_name() == DEFINITION_FILE {
                registry.insert(load_entry(dent.path())?)?;
            }
        }
        debug!(base = %base.display(), count = registry.len(), "loaded registry");
        Ok(registry)
    }

    pub fn insert(&mut self, entry: Entry) -> Result<(), CoreError> {
        if let Some(existing) = self.entries.get(&entry.slug) {
            return Err(CoreError::DuplicateSlug {
                slug: entry.slug,
                first: existing.file.clone(),
                second: entry.file,
            });
        }
        self.entries.insert(entry.slug.clone(), entry);
        Ok(())
    }

    pub fn get(&self, slug: &str) -> Option<&Entry> {
        self.entries.get(slug)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a single definition file.
pub fn load_entry(path: &Path) -> Result<Entry, CoreError> {
    let source = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let malformed = |source| CoreError::Malformed {
        path: path.to_path_buf(),
        source,
    };
    let table: toml::Table = toml::from_str(&source).map_err(malformed)?;
    let definition: Definition = toml::from_str(&source).map_err(malformed)?;
    Ok(Entry {
        slug: slugify(&definition.name),
        definition,
        table,
        source,
        file: path.to_path_buf(),
    })
}

/// Lowercase the name and collapse every run of non-alphanumerics to `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.') || name == "target")
}
