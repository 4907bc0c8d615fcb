use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status} for {url}")]
    Server { status: u16, url: String },
    #[error("invalid URL {url}: {reason}")]
    Url { url: String, reason: String },
    #[error("unsupported URL scheme {0}")]
    Scheme(String),
    #[error("FTP {command} failed: {code} {message}")]
    Ftp {
        command: String,
        code: u16,
        message: String,
    },
    #[error("malformed FTP reply: {0}")]
    FtpReply(String),
    #[error("unparseable timestamp {0:?}")]
    Timestamp(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unrecognized region {region:?} in {name:?}")]
    UnrecognizedRegion { region: String, name: String },
    #[error("unrecognized geographic name {0:?}")]
    UnrecognizedName(String),
}

impl SyncError {
    /// True when the remote host could not be reached at all.
    pub fn is_connect(&self) -> bool {
        match self {
            SyncError::Http(err) => err.is_connect(),
            SyncError::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::NotFound
                    | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}
