//! Upstream access: freshness probes and downloads over HTTP and FTP, plus
//! readers for the tracking spreadsheet, census listing and Represent API.

mod error;

pub mod freshness;
pub mod ftp;
pub mod http;
pub mod remote;
pub mod represent;
pub mod sheets;
pub mod source;

pub use error::SyncError;
pub use freshness::Freshness;
pub use http::HttpClient;
pub use remote::{Probe, Remote, UrlStatus};
pub use represent::RepresentClient;
pub use sheets::{CensusRow, SheetRow, TrackingSheet};
pub use source::{RemoteUrl, Scheme};
