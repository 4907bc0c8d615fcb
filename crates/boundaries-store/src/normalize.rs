//! Turns a staged download into exactly one shapefile set.
//!
//! The steps run in order: unpack archives, convert KML, merge several
//! shapefiles into one `Boundaries` layer, flatten 3D polygons to 2D, then
//! apply any per-definition `ogr2ogr` arguments. Each step that rewrites a
//! shapefile converts into a scratch directory and moves the result back.

use std::fs;
use std::path::{Path, PathBuf};

use boundaries_core::{DEFINITION_FILE, LICENSE_FILE};
use tracing::{debug, info};

use crate::StoreError;
use crate::archive::{extract_kmz, extract_zip};
use crate::format::StagedFormat;
use crate::ogr::{Conversion, GeoTool};

/// Files that survive cleaning a jurisdiction directory, besides the file
/// staged by the current run.
pub const KEEP: &[&str] = &[DEFINITION_FILE, LICENSE_FILE, ".DS_Store"];

/// Layer name given to merged shapefiles.
pub const MERGED_LAYER: &str = "Boundaries";

/// Delete every file in `dir` except those in [`KEEP`] and `staged`, and
/// return the deleted paths. Leftovers from earlier runs, such as a rejected
/// `data.kml`, are deleted too. Subdirectories are left alone.
pub fn clean_directory(dir: &Path, staged: &str) -> Result<Vec<PathBuf>, StoreError> {
    let mut removed = Vec::new();
    for path in files_in(dir)? {
        let keep = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name == staged || KEEP.contains(&name));
        if !keep {
            fs::remove_file(&path).map_err(StoreError::io(&path))?;
            debug!(path = %path.display(), "removed");
            removed.push(path);
        }
    }
    Ok(removed)
}

pub struct Normalizer<'a, G: GeoTool> {
    tool: &'a G,
    dir: &'a Path,
}

impl<'a, G: GeoTool> Normalizer<'a, G> {
    pub fn new(tool: &'a G, dir: &'a Path) -> Self {
        Self { tool, dir }
    }

    /// Run every step and return the geodata files left in the directory.
    pub fn run(
        &self,
        staged: &StagedFormat,
        ogr2ogr_args: Option<&str>,
    ) -> Result<Vec<PathBuf>, StoreError> {
        let staged_path = self.dir.join(staged.file_name()?);
        match staged {
            StagedFormat::Zip => {
                extract_zip(&staged_path, self.dir)?;
            }
            StagedFormat::Kmz => {
                extract_kmz(&staged_path, self.dir)?;
            }
            StagedFormat::Kml => {}
            StagedFormat::Unsupported(ext) => return Err(StoreError::Unsupported(ext.clone())),
        }

        let kmz = self.dir.join("data.kmz");
        if kmz.exists() {
            extract_kmz(&kmz, self.dir)?;
        }
        let kml = self.dir.join("data.kml");
        if kml.exists() {
            self.convert_kml(&kml)?;
        }

        self.merge()?;
        self.flatten()?;
        if let Some(args) = ogr2ogr_args.filter(|args| !args.trim().is_empty()) {
            self.apply_extra_args(args)?;
        }
        self.geodata_files()
    }

    /// Convert a single-layer KML document to a shapefile, then delete it.
    pub fn convert_kml(&self, kml: &Path) -> Result<(), StoreError> {
        let layers = self.tool.layers(kml)?;
        let layer = match layers.as_slice() {
            [] => return Err(StoreError::NoLayers(kml.to_path_buf())),
            [layer] => layer,
            _ => {
                return Err(StoreError::TooManyLayers {
                    path: kml.to_path_buf(),
                    count: layers.len(),
                });
            }
        };
        self.tool.convert(
            &Conversion::new(self.dir, kml)
                .args(["-nlt", "POLYGON"])
                .arg(&layer.name),
        )?;
        fs::remove_file(kml).map_err(StoreError::io(kml))
    }

    /// Append every shapefile into one `Boundaries` layer and delete the
    /// sources. Does nothing when there is at most one shapefile.
    pub fn merge(&self) -> Result<(), StoreError> {
        let shapefiles = self.shapefiles()?;
        if shapefiles.len() < 2 {
            return Ok(());
        }
        info!(dir = %self.dir.display(), count = shapefiles.len(), "merging shapefiles");
        for shp in &shapefiles {
            let Some(stem) = shp.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem == MERGED_LAYER {
                continue;
            }
            self.tool.convert(
                &Conversion::new(self.dir, shp).args(["-update", "-append", "-nln", MERGED_LAYER]),
            )?;
            self.remove_component_set(stem)?;
        }
        Ok(())
    }

    /// Rewrite a 3D polygon shapefile as 2D. A 2D shapefile is left as is.
    pub fn flatten(&self) -> Result<(), StoreError> {
        let Some(shp) = self.single_shapefile()? else {
            return Ok(());
        };
        let layers = self.tool.layers(&shp)?;
        if layers.len() > 1 {
            return Err(StoreError::TooManyLayers {
                path: shp,
                count: layers.len(),
            });
        }
        if layers.iter().any(|layer| layer.is_3d_polygon()) {
            info!(path = %shp.display(), "flattening 3D polygons");
            self.rewrite(&shp, ["-nlt", "POLYGON", "-dim", "2"])?;
        }
        Ok(())
    }

    /// Apply shell-quoted `ogr2ogr` arguments to the shapefile.
    pub fn apply_extra_args(&self, args: &str) -> Result<(), StoreError> {
        let words = shlex::split(args).ok_or_else(|| StoreError::Arguments(args.to_string()))?;
        let Some(shp) = self.single_shapefile()? else {
            debug!(dir = %self.dir.display(), "no shapefile for extra ogr2ogr arguments");
            return Ok(());
        };
        self.rewrite(&shp, std::iter::once("-overwrite".to_string()).chain(words))
    }

    /// Convert `shp` into a scratch directory, then replace its whole
    /// component set with the output.
    fn rewrite<I, S>(&self, shp: &Path, args: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let scratch = tempfile::Builder::new()
            .prefix(".scratch-")
            .tempdir_in(self.dir)
            .map_err(StoreError::io(self.dir))?;
        self.tool
            .convert(&Conversion::new(scratch.path(), shp).args(args))?;
        if let Some(stem) = shp.file_stem().and_then(|s| s.to_str()) {
            self.remove_component_set(stem)?;
        }
        for produced in files_in(scratch.path())? {
            let Some(name) = produced.file_name() else {
                continue;
            };
            let dest = self.dir.join(name);
            fs::rename(&produced, &dest).map_err(StoreError::io(&dest))?;
        }
        Ok(())
    }

    fn single_shapefile(&self) -> Result<Option<PathBuf>, StoreError> {
        Ok(self.shapefiles()?.into_iter().next())
    }

    fn shapefiles(&self) -> Result<Vec<PathBuf>, StoreError> {
        Ok(files_in(self.dir)?
            .into_iter()
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("shp"))
            })
            .collect())
    }

    /// Delete `stem.*` sidecars, including `stem.shp.xml`. Files of another
    /// set whose stem merely starts with `stem.` are kept.
    fn remove_component_set(&self, stem: &str) -> Result<(), StoreError> {
        for path in files_in(self.dir)? {
            let matches = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| name.strip_prefix(stem))
                .and_then(|rest| rest.strip_prefix('.'))
                .is_some_and(|ext| !ext.contains('.') || ext.eq_ignore_ascii_case("shp.xml"));
            if matches {
                fs::remove_file(&path).map_err(StoreError::io(&path))?;
            }
        }
        Ok(())
    }

    /// Everything in the directory except the definition, licence and
    /// `.DS_Store`.
    pub fn geodata_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        Ok(files_in(self.dir)?
            .into_iter()
            .filter(|path| {
                !path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| matches!(name, DEFINITION_FILE | LICENSE_FILE | ".DS_Store"))
            })
            .collect())
    }
}

/// Regular files directly inside `dir`, sorted by name.
fn files_in(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(StoreError::io(dir))? {
        let entry = entry.map_err(StoreError::io(dir))?;
        let is_file = entry
            .file_type()
            .map_err(StoreError::io(entry.path()))?
            .is_file();
        if is_file {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
