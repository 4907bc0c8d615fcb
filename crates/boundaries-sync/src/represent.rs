//! Reader for the Represent API: which census subdivisions already have a
//! representative set, and where its data comes from.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use tracing::{debug, info};

use crate::SyncError;
use crate::http::HttpClient;

pub struct RepresentClient {
    http: HttpClient,
    base_url: String,
}

#[derive(Deserialize)]
struct Page<T> {
    objects: Vec<T>,
}

#[derive(Deserialize)]
struct RepresentativeSet {
    #[serde(default, alias = "scraperwiki_url")]
    data_url: Option<String>,
    #[serde(default)]
    related: Related,
}

#[derive(Deserialize, Default)]
struct Related {
    boundary_set_url: Option<String>,
}

#[derive(Deserialize)]
struct BoundarySet {
    #[serde(default)]
    metadata: Option<HashMap<String, serde_json::Value>>,
}

impl BoundarySet {
    fn geographic_code(&self) -> Option<&str> {
        self.metadata
            .as_ref()?
            .get("geographic_code")?
            .as_str()
            .filter(|code| !code.is_empty())
    }
}

impl RepresentClient {
    /// `base_url` should be like `https://represent.opennorth.ca` (no trailing slash).
    pub fn new(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Map each geographic code with a representative set to that set's data URL.
    ///
    /// One request per boundary set, issued in order.
    pub async fn data_urls_by_geographic_code(&self) -> Result<BTreeMap<String, String>, SyncError> {
        let url = format!("{}/representative-sets/?limit=0", self.base_url);
        info!(url = %url, "listing representative sets");
        let sets: Page<RepresentativeSet> = self.http.get_json(&url).await?;

        let mut out = BTreeMap::new();
        for set in sets.objects {
            let (Some(path), Some(data_url)) = (set.related.boundary_set_url, set.data_url) else {
                continue;
            };
            let boundary_set: BoundarySet = self
                .http
                .get_json(&format!("{}{}", self.base_url, path))
                .await?;
            if let Some(code) = boundary_set.geographic_code() {
                debug!(code, data_url = %data_url, "representative set");
                out.insert(code.to_string(), data_url);
            }
        }
        Ok(out)
    }
}
