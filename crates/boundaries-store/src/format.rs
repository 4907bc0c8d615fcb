//! The formats a download can be staged in.

use std::fmt;

use crate::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagedFormat {
    Zip,
    Kml,
    Kmz,
    /// Anything else, with the extension that was seen (possibly empty).
    Unsupported(String),
}

impl StagedFormat {
    pub fn from_extension(extension: Option<&str>) -> Self {
        let extension = extension.unwrap_or_default().trim_start_matches('.');
        match extension.to_ascii_lowercase().as_str() {
            "zip" => StagedFormat::Zip,
            "kml" => StagedFormat::Kml,
            "kmz" => StagedFormat::Kmz,
            _ => StagedFormat::Unsupported(extension.to_string()),
        }
    }

    /// Extension used for the staged file, or an error for unsupported formats.
    pub fn extension(&self) -> Result<&'static str, StoreError> {
        match self {
            StagedFormat::Zip => Ok("zip"),
            StagedFormat::Kml => Ok("kml"),
            StagedFormat::Kmz => Ok("kmz"),
            StagedFormat::Unsupported(ext) => Err(StoreError::Unsupported(ext.clone())),
        }
    }

    /// Name of the staged file inside a jurisdiction directory.
    pub fn file_name(&self) -> Result<String, StoreError> {
        self.extension().map(|ext| format!("data.{ext}"))
    }
}

impl fmt::Display for StagedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StagedFormat::Unsupported(ext) => write!(f, "unsupported ({ext})"),
            other => f.write_str(other.extension().unwrap_or_default()),
        }
    }
}
