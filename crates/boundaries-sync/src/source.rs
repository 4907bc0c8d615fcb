//! Parsed upstream URLs: scheme, credentials and file-name hints.

use std::path::Path;

use reqwest::Url;

use crate::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Ftp,
}

/// An upstream URL with any embedded credentials split off.
#[derive(Debug, Clone)]
pub struct RemoteUrl {
    pub scheme: Scheme,
    /// The URL without user info.
    pub url: Url,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl RemoteUrl {
    pub fn parse(raw: &str) -> Result<Self, SyncError> {
        let mut url = Url::parse(raw).map_err(|err| SyncError::Url {
            url: raw.to_string(),
            reason: err.to_string(),
        })?;
        let scheme = match url.scheme() {
            "http" | "https" => Scheme::Http,
            "ftp" => Scheme::Ftp,
            other => return Err(SyncError::Scheme(other.to_string())),
        };
        let username = Some(url.username())
            .filter(|u| !u.is_empty())
            .map(str::to_string);
        let password = url.password().map(str::to_string);
        if username.is_some() || password.is_some() {
            let invalid = |_| SyncError::Url {
                url: raw.to_string(),
                reason: "cannot strip credentials".to_string(),
            };
            url.set_username("").map_err(invalid)?;
            url.set_password(None).map_err(invalid)?;
        }
        Ok(Self {
            scheme,
            url,
            username,
            password,
        })
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// The path's last segment.
    pub fn basename(&self) -> &str {
        self.url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
    }

    /// The path without its last segment.
    pub fn parent(&self) -> &str {
        let path = self.url.path();
        match path.rfind('/') {
            Some(0) | None => "/",
            Some(i) => &path[..i],
        }
    }

    /// Lowercased extension of the URL path, without the dot.
    pub fn extension(&self) -> Option<String> {
        extension_of(self.basename())
    }
}

pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_ascii_lowercase)
}

/// The file name in a `Content-Disposition` header, preferring the RFC 5987
/// `filename*` form.
///
/// Only the extension of the result is used, so percent-escapes in
/// `filename*` values are left as they are.
pub fn disposition_filename(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;
    for param in split_params(header).into_iter().skip(1) {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename" => plain = Some(unquote(value.trim())),
            "filename*" => {
                let value = value.trim();
                let name = value.split_once("''").map_or(value, |(_, name)| name);
                extended = Some(unquote(name));
            }
            _ => {}
        }
    }
    extended.or(plain).filter(|name| !name.is_empty())
}

fn split_params(header: &str) -> Vec<String> {
    let mut params = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut escaped = false;
    for c in header.chars() {
        match c {
            _ if escaped => {
                current.push(c);
                escaped = false;
            }
            '\\' if quoted => {
                current.push(c);
                escaped = true;
            }
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            ';' if !quoted => params.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    params.push(current);
    params
}

fn unquote(value: &str) -> String {
    match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => value.to_string(),
    }
}
