//! Scheme dispatch for upstream datasets: probe a URL for its modification
//! date and format, fetch it into a jurisdiction directory, or check that it
//! still resolves.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use crate::SyncError;
use crate::ftp::{DEFAULT_PORT, FtpSession};
use crate::http::HttpClient;
use crate::source::{RemoteUrl, Scheme, disposition_filename, extension_of};

/// What a probe learned about an upstream file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub modified: NaiveDate,
    /// Lowercased extension the download will be staged under.
    pub extension: Option<String>,
}

/// Outcome of a reachability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlStatus {
    Ok,
    /// The host answered but the file is not there, or the host is unreachable.
    Missing,
    /// Any other HTTP status.
    Status(u16),
}

impl UrlStatus {
    /// The status code printed beside a failing URL.
    pub fn code(self) -> Option<u16> {
        match self {
            UrlStatus::Ok => None,
            UrlStatus::Missing => Some(404),
            UrlStatus::Status(code) => Some(code),
        }
    }
}

#[derive(Clone, Default)]
pub struct Remote {
    http: HttpClient,
}

impl Remote {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Read the upstream modification date. HTTP resources without a
    /// `Last-Modified` header count as modified today.
    pub async fn probe(&self, url: &str) -> Result<Probe, SyncError> {
        let remote = RemoteUrl::parse(url)?;
        match remote.scheme {
            Scheme::Ftp => {
                let mut session = self.ftp_session(&remote).await?;
                let modified = session.mdtm(remote.url.path()).await?;
                session.quit().await?;
                Ok(Probe {
                    modified,
                    extension: remote.extension(),
                })
            }
            Scheme::Http => {
                let head = self.http.head(&remote).await?;
                if !(200..300).contains(&head.status) {
                    return Err(SyncError::Server {
                        status: head.status,
                        url: remote.url.to_string(),
                    });
                }
                let modified = head.last_modified.unwrap_or_else(|| {
                    debug!(url = %remote.url, "no Last-Modified header, assuming today");
                    Local::now().date_naive()
                });
                let extension = head
                    .content_disposition
                    .as_deref()
                    .and_then(disposition_filename)
                    .and_then(|name| extension_of(&name))
                    .or_else(|| remote.extension());
                Ok(Probe {
                    modified,
                    extension,
                })
            }
        }
    }

    /// Download `url` into `dir` as `data.<extension>` and return its path.
    pub async fn fetch(&self, url: &str, extension: &str, dir: &Path) -> Result<PathBuf, SyncError> {
        let remote = RemoteUrl::parse(url)?;
        let dest = dir.join(format!("data.{extension}"));
        match remote.scheme {
            Scheme::Ftp => {
                info!(url = %remote.url, dest = %dest.display(), "downloading");
                let mut session = self.ftp_session(&remote).await?;
                session.retr(remote.url.path(), &dest).await?;
                session.quit().await?;
            }
            Scheme::Http => {
                self.http.download(&remote, &dest).await?;
            }
        }
        Ok(dest)
    }

    /// Check that `url` still resolves. Unreachable hosts count as missing;
    /// other failures propagate.
    pub async fn check(&self, url: &str) -> Result<UrlStatus, SyncError> {
        let remote = RemoteUrl::parse(url)?;
        let result = match remote.scheme {
            Scheme::Ftp => self.check_ftp(&remote).await,
            Scheme::Http => self.http.head(&remote).await.map(|head| match head.status {
                200 => UrlStatus::Ok,
                status => UrlStatus::Status(status),
            }),
        };
        match result {
            Err(err) if err.is_connect() => {
                debug!(url, error = %err, "unreachable");
                Ok(UrlStatus::Missing)
            }
            other => other,
        }
    }

    async fn check_ftp(&self, remote: &RemoteUrl) -> Result<UrlStatus, SyncError> {
        let mut session = self.ftp_session(remote).await?;
        session.cwd(remote.parent()).await?;
        let names = session.nlst().await?;
        session.quit().await?;
        if names.iter().any(|name| name == remote.basename()) {
            Ok(UrlStatus::Ok)
        } else {
            Ok(UrlStatus::Missing)
        }
    }

    async fn ftp_session(&self, remote: &RemoteUrl) -> Result<FtpSession, SyncError> {
        let port = remote.url.port().unwrap_or(DEFAULT_PORT);
        let mut session = FtpSession::connect(remote.host(), port).await?;
        session
            .login(remote.username.as_deref(), remote.password.as_deref())
            .await?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    struct Canned {
        status: u16,
        headers: &'static [(&'static str, &'static str)],
        body: &'static [u8],
    }

    /// An HTTP/1.1 server answering every request with `respond(method, path)`,
    /// one request per connection. Returns `host:port` and the request heads.
    async fn http_server(respond: fn(&str, &str) -> Canned) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let host = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let seen = seen.clone();
                tokio::spawn(async move {
                    let mut raw = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
                        let n = stream.read(&mut buf).await.unwrap();
                        if n == 0 {
                            return;
                        }
                        raw.extend_from_slice(&buf[..n]);
                    }
                    let head = String::from_utf8_lossy(&raw).into_owned();
                    let mut words = head.split_whitespace();
                    let method = words.next().unwrap_or_default();
                    let path = words.next().unwrap_or_default();
                    let canned = respond(method, path);
                    let send_body = method != "HEAD";
                    seen.lock().unwrap().push(head.clone());

                    let mut reply = format!(
                        "HTTP/1.1 {} Canned\r\nContent-Length: {}\r\nConnection: close\r\n",
                        canned.status,
                        canned.body.len()
                    );
                    for (name, value) in canned.headers {
                        reply.push_str(&format!("{name}: {value}\r\n"));
                    }
                    reply.push_str("\r\n");
                    stream.write_all(reply.as_bytes()).await.unwrap();
                    if send_body {
                        stream.write_all(canned.body).await.unwrap();
                    }
                    let _ = stream.shutdown().await;
                });
            }
        });
        (host, requests)
    }

    fn http_remote() -> Remote {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        Remote::new(HttpClient::from_client(client))
    }

    const NOV_26: &str = "Tue, 26 Nov 2013 10:00:00 GMT";

    #[tokio::test]
    async fn http_missing_last_modified_is_today() {
        let (host, _) = http_server(|_, _| Canned {
            status: 200,
            headers: &[],
            body: b"",
        })
        .await;
        let probe = http_remote()
            .probe(&format!("http://{host}/data/wards.zip"))
            .await
            .unwrap();
        assert_eq!(probe.modified, Local::now().date_naive());
        assert_eq!(probe.extension.as_deref(), Some("zip"));
    }

    #[tokio::test]
    async fn http_disposition_extension_wins() {
        let (host, _) = http_server(|_, _| Canned {
            status: 200,
            headers: &[
                ("Last-Modified", NOV_26),
                ("Content-Disposition", "attachment; filename=\"Wards 2013.KMZ\""),
            ],
            body: b"",
        })
        .await;
        let probe = http_remote()
            .probe(&format!("http://{host}/download.php?id=7"))
            .await
            .unwrap();
        assert_eq!(probe.modified, NaiveDate::from_ymd_opt(2013, 11, 26).unwrap());
        assert_eq!(probe.extension.as_deref(), Some("kmz"));
    }

    #[tokio::test]
    async fn http_head_error_status_fails() {
        let (host, _) = http_server(|_, _| Canned {
            status: 500,
            headers: &[],
            body: b"",
        })
        .await;
        assert!(matches!(
            http_remote().probe(&format!("http://{host}/wards.zip")).await,
            Err(SyncError::Server { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn http_credentials_become_basic_auth() {
        let (host, requests) = http_server(|_, _| Canned {
            status: 200,
            headers: &[("Last-Modified", NOV_26)],
            body: b"",
        })
        .await;
        http_remote()
            .probe(&format!("http://user:secret@{host}/wards.zip"))
            .await
            .unwrap();

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let head = &requests[0];
        assert!(head.starts_with("HEAD /wards.zip "), "{head}");
        assert!(
            head.to_ascii_lowercase()
                .contains("authorization: basic dxnlcjpzzwnyzxq=\r\n"),
            "{head}"
        );
    }

    #[tokio::test]
    async fn http_fetch_streams_body_to_staging_name() {
        let (host, _) = http_server(|method, path| match (method, path) {
            ("GET", "/wards.zip") => Canned {
                status: 200,
                headers: &[],
                body: b"PK\x03\x04 archive body",
            },
            _ => Canned {
                status: 404,
                headers: &[],
                body: b"",
            },
        })
        .await;
        let tmp = tempfile::TempDir::new().unwrap();
        let dest = http_remote()
            .fetch(&format!("http://{host}/wards.zip"), "zip", tmp.path())
            .await
            .unwrap();
        assert_eq!(dest, tmp.path().join("data.zip"));
        assert_eq!(fs::read(&dest).unwrap(), b"PK\x03\x04 archive body");
    }

    #[tokio::test]
    async fn http_fetch_error_status_stages_nothing() {
        let (host, _) = http_server(|_, _| Canned {
            status: 403,
            headers: &[],
            body: b"forbidden",
        })
        .await;
        let tmp = tempfile::TempDir::new().unwrap();
        let result = http_remote()
            .fetch(&format!("http://{host}/wards.zip"), "zip", tmp.path())
            .await;
        assert!(matches!(result, Err(SyncError::Server { status: 403, .. })));
        assert!(!tmp.path().join("data.zip").exists());
    }

    #[tokio::test]
    async fn http_check_reports_status() {
        let (host, _) = http_server(|_, path| Canned {
            status: if path == "/wards.zip" { 200 } else { 410 },
            headers: &[],
            body: b"",
        })
        .await;
        let remote = http_remote();
        assert_eq!(
            remote.check(&format!("http://{host}/wards.zip")).await.unwrap(),
            UrlStatus::Ok
        );
        assert_eq!(
            remote.check(&format!("http://{host}/gone.zip")).await.unwrap(),
            UrlStatus::Status(410)
        );
    }

    /// An FTP server that logs anyone in and answers `MDTM` for one file.
    async fn mdtm_server(stamp: &'static str) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (reader, mut writer) = stream.into_split();
            let mut lines = BufReader::new(reader).lines();
            writer.write_all(b"220 ready\r\n").await.unwrap();
            while let Some(line) = lines.next_line().await.unwrap() {
                let reply = match line.split_whitespace().next() {
                    Some("USER") => "331 password please\r\n".to_string(),
                    Some("PASS") => "230 logged in\r\n".to_string(),
                    Some("MDTM") => format!("213 {stamp}\r\n"),
                    Some("QUIT") => {
                        writer.write_all(b"221 bye\r\n").await.unwrap();
                        break;
                    }
                    _ => "502 not implemented\r\n".to_string(),
                };
                writer.write_all(reply.as_bytes()).await.unwrap();
            }
        });
        port
    }

    #[tokio::test]
    async fn ftp_probe_reads_mdtm() {
        let port = mdtm_server("20131126120000").await;
        let url = format!("ftp://127.0.0.1:{port}/pub/Wards.KMZ");
        let probe = Remote::default().probe(&url).await.unwrap();
        assert_eq!(probe.modified, NaiveDate::from_ymd_opt(2013, 11, 26).unwrap());
        assert_eq!(probe.extension.as_deref(), Some("kmz"));
    }

    #[tokio::test]
    async fn unreachable_host_is_missing() {
        // Bind then drop to get a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let status = Remote::default()
            .check(&format!("ftp://127.0.0.1:{port}/pub/wards.zip"))
            .await
            .unwrap();
        assert_eq!(status, UrlStatus::Missing);
        assert_eq!(status.code(), Some(404));
    }

    #[test]
    fn status_codes() {
        assert_eq!(UrlStatus::Ok.code(), None);
        assert_eq!(UrlStatus::Status(500).code(), Some(500));
    }
}
