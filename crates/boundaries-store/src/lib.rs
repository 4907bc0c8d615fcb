//! Jurisdiction directories on disk: staged downloads, GDAL conversions,
//! git staging and definition updates.

mod error;
pub use error::StoreError;

pub mod archive;
pub mod format;
pub mod normalize;
pub mod ogr;
pub mod state;
pub mod vcs;

pub use format::StagedFormat;
pub use normalize::{Normalizer, clean_directory};
pub use ogr::{GeoTool, Ogr};
pub use state::StateUpdater;
pub use vcs::{Git, VersionControl};
