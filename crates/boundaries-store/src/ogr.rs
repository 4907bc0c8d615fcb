//! The GDAL command-line tools, behind a trait so the normalizer can be
//! exercised without them.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::StoreError;

static LAYER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+: (\S+)(?: \((.+)\))?").expect("static pattern")
});

/// A layer as listed by `ogrinfo -q`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub name: String,
    /// Geometry type, e.g. `Polygon` or `3D Polygon`, when reported.
    pub geometry: Option<String>,
}

impl Layer {
    pub fn is_3d_polygon(&self) -> bool {
        self.geometry
            .as_deref()
            .is_some_and(|g| g.contains("3D Polygon"))
    }
}

/// Parse the summary `ogrinfo -q` prints, ignoring `3D Point` layers.
pub fn parse_layers(output: &str) -> Vec<Layer> {
    output
        .lines()
        .filter(|line| !line.contains("3D Point"))
        .filter_map(|line| LAYER_LINE.captures(line.trim()))
        .map(|caps| Layer {
            name: caps[1].to_string(),
            geometry: caps.get(2).map(|m| m.as_str().to_string()),
        })
        .collect()
}

/// One `ogr2ogr` invocation writing ESRI shapefiles into `dest`.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub dest: PathBuf,
    pub source: PathBuf,
    pub args: Vec<OsString>,
}

impl Conversion {
    pub fn new(dest: &Path, source: &Path) -> Self {
        Self {
            dest: dest.to_path_buf(),
            source: source.to_path_buf(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Arguments after the program name.
    pub fn argv(&self) -> Vec<OsString> {
        let mut argv: Vec<OsString> = vec!["-f".into(), "ESRI Shapefile".into()];
        argv.push(self.dest.clone().into_os_string());
        argv.push(self.source.clone().into_os_string());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words: Vec<String> = self
            .argv()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let quoted = shlex::try_join(words.iter().map(String::as_str))
            .unwrap_or_else(|_| words.join(" "));
        write!(f, "ogr2ogr {quoted}")
    }
}

/// The operations the normalizer needs from GDAL.
pub trait GeoTool {
    /// Output of `ogrinfo -q <path>`.
    fn info(&self, path: &Path) -> Result<String, StoreError>;

    fn convert(&self, conversion: &Conversion) -> Result<(), StoreError>;

    fn layers(&self, path: &Path) -> Result<Vec<Layer>, StoreError> {
        self.info(path).map(|out| parse_layers(&out))
    }
}

/// The real `ogrinfo` and `ogr2ogr` binaries, found on `PATH` by default.
#[derive(Debug, Clone)]
pub struct Ogr {
    ogrinfo: PathBuf,
    ogr2ogr: PathBuf,
}

impl Default for Ogr {
    fn default() -> Self {
        Self {
            ogrinfo: PathBuf::from("ogrinfo"),
            ogr2ogr: PathBuf::from("ogr2ogr"),
        }
    }
}

impl Ogr {
    pub fn new(ogrinfo: impl Into<PathBuf>, ogr2ogr: impl Into<PathBuf>) -> Self {
        Self {
            ogrinfo: ogrinfo.into(),
            ogr2ogr: ogr2ogr.into(),
        }
    }
}

impl GeoTool for Ogr {
    fn info(&self, path: &Path) -> Result<String, StoreError> {
        debug!(path = %path.display(), "ogrinfo -q");
        let output = Command::new(&self.ogrinfo)
            .arg("-q")
            .arg(path)
            .output()
            .map_err(|source| StoreError::Spawn {
                program: self.ogrinfo.display().to_string(),
                source,
            })?;
        if !output.status.success() {
            return Err(StoreError::Tool {
                command: format!("ogrinfo -q {}", path.display()),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn convert(&self, conversion: &Conversion) -> Result<(), StoreError> {
        info!(command = %conversion, "running");
        let output = Command::new(&self.ogr2ogr)
            .args(conversion.argv())
            .output()
            .map_err(|source| StoreError::Spawn {
                program: self.ogr2ogr.display().to_string(),
                source,
            })?;
        if !output.status.success() {
            return Err(StoreError::Tool {
                command: conversion.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
