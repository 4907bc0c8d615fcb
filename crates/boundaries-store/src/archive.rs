//! Unpacking of staged ZIP and KMZ archives into a jurisdiction directory.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::StoreError;

/// Extract every file in a ZIP archive into `dir`, flattening its hierarchy.
/// A `.kml` or `.kmz` entry is written as `data.kml` or `data.kmz`; other
/// entries keep their base name. The archive is deleted whether or not
/// extraction succeeds.
pub fn extract_zip(archive: &Path, dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    info!(archive = %archive.display(), "extracting ZIP");
    let result = unpack(archive, dir, |name| match extension(name).as_deref() {
        Some(ext @ ("kml" | "kmz")) => Some(format!("data.{ext}")),
        _ => Some(name.to_string()),
    })
    .map_err(|err| err.into_store(archive, false));
    remove_staged(archive)?;
    result
}

/// Extract the KML document of a KMZ archive as `data.kml`. Supporting files
/// in the archive are ignored. The archive is deleted whether or not
/// extraction succeeds.
pub fn extract_kmz(archive: &Path, dir: &Path) -> Result<Option<PathBuf>, StoreError> {
    info!(archive = %archive.display(), "extracting KMZ");
    let result = unpack(archive, dir, |name| {
        (extension(name).as_deref() == Some("kml")).then(|| "data.kml".to_string())
    })
    .map(|written| written.into_iter().next())
    .map_err(|err| err.into_store(archive, true));
    remove_staged(archive)?;
    result
}

enum UnpackError {
    Zip(ZipError),
    Io(PathBuf, io::Error),
}

impl UnpackError {
    fn into_store(self, archive: &Path, kmz: bool) -> StoreError {
        match self {
            UnpackError::Zip(source) if kmz => StoreError::BadKmz {
                path: archive.to_path_buf(),
                source,
            },
            UnpackError::Zip(source) => StoreError::BadZip {
                path: archive.to_path_buf(),
                source,
            },
            UnpackError::Io(path, source) => StoreError::Io { path, source },
        }
    }
}

/// Write each file entry whose base name `rename` maps to a target name.
fn unpack(
    archive: &Path,
    dir: &Path,
    rename: impl Fn(&str) -> Option<String>,
) -> Result<Vec<PathBuf>, UnpackError> {
    let file = File::open(archive).map_err(|e| UnpackError::Io(archive.to_path_buf(), e))?;
    let mut zip = ZipArchive::new(file).map_err(UnpackError::Zip)?;
    let mut written = Vec::new();
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(UnpackError::Zip)?;
        if entry.is_dir() {
            continue;
        }
        let Some(base) = Path::new(entry.name())
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
        else {
            continue;
        };
        let Some(target) = rename(&base) else {
            debug!(entry = entry.name(), "skipping archive entry");
            continue;
        };
        let dest = dir.join(target);
        let mut out = File::create(&dest).map_err(|e| UnpackError::Io(dest.clone(), e))?;
        io::copy(&mut entry, &mut out).map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => UnpackError::Zip(ZipError::Io(e)),
            _ => UnpackError::Io(dest.clone(), e),
        })?;
        debug!(entry = entry.name(), dest = %dest.display(), "extracted");
        if !written.contains(&dest) {
            written.push(dest);
        }
    }
    Ok(written)
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

fn remove_staged(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(StoreError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    /// Write a ZIP archive; names ending in `/` become directories.
    pub(crate) fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default();
        for (name, body) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, options).unwrap();
            } else {
                zip.start_file(*name, options).unwrap();
                zip.write_all(body).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    #[test]
    fn zip_is_flattened_and_removed() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("data.zip");
        write_zip(
            &archive,
            &[
                ("Wards/", b""),
                ("Wards/wards.shp", b"shp"),
                ("Wards/wards.dbf", b"dbf"),
                ("readme.txt", b"hello"),
            ],
        );

        let written = extract_zip(&archive, tmp.path()).unwrap();
        assert_eq!(written.len(), 3);
        assert!(!archive.exists());
        assert_eq!(fs::read(tmp.path().join("wards.shp")).unwrap(), b"shp");
        assert!(tmp.path().join("readme.txt").exists());
        assert!(!tmp.path().join("Wards").exists());
    }

    #[test]
    fn zipped_kml_and_kmz_get_staging_names() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("data.zip");
        write_zip(
            &archive,
            &[("export/Wards 2014.KML", b"<kml/>"), ("other.kmz", b"PK")],
        );

        extract_zip(&archive, tmp.path()).unwrap();
        assert_eq!(fs::read(tmp.path().join("data.kml")).unwrap(), b"<kml/>");
        assert!(tmp.path().join("data.kmz").exists());
    }

    #[test]
    fn corrupt_zip_is_reported_and_removed() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("data.zip");
        fs::write(&archive, b"this is not a zip file").unwrap();

        let err = extract_zip(&archive, tmp.path()).unwrap_err();
        assert!(matches!(err, StoreError::BadZip { .. }), "{err}");
        assert!(!archive.exists());
    }

    #[test]
    fn kmz_yields_only_its_kml() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("data.kmz");
        write_zip(
            &archive,
            &[("doc.kml", b"<kml/>"), ("files/icon.png", b"png")],
        );

        let kml = extract_kmz(&archive, tmp.path()).unwrap();
        assert_eq!(kml, Some(tmp.path().join("data.kml")));
        assert!(!tmp.path().join("icon.png").exists());
        assert!(!archive.exists());
    }

    #[test]
    fn corrupt_kmz_is_reported_and_removed() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("data.kmz");
        fs::write(&archive, b"garbage").unwrap();

        assert!(matches!(
            extract_kmz(&archive, tmp.path()),
            Err(StoreError::BadKmz { .. })
        ));
        assert!(!archive.exists());
    }
}
