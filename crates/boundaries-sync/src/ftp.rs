//! A small FTP client: enough of RFC 959 (plus `MDTM` from RFC 3659) to
//! log in, read modification times, list a directory and retrieve a file.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::debug;

use crate::SyncError;

pub const DEFAULT_PORT: u16 = 21;

const ANONYMOUS_USER: &str = "anonymous";
const ANONYMOUS_PASSWORD: &str = "anonymous@";

/// One server reply. Multi-line replies are joined with newlines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub text: String,
}

/// An open control connection.
pub struct FtpSession {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    host: String,
}

impl FtpSession {
    pub async fn connect(host: &str, port: u16) -> Result<Self, SyncError> {
        debug!(host, port, "FTP connect");
        let stream = TcpStream::connect((host, port)).await?;
        let (reader, writer) = stream.into_split();
        let mut session = Self {
            reader: BufReader::new(reader),
            writer,
            host: host.to_string(),
        };
        let greeting = session.read_reply().await?;
        check("connect", &greeting, &[220])?;
        Ok(session)
    }

    /// Log in, anonymously when no user is given.
    pub async fn login(&mut self, user: Option<&str>, password: Option<&str>) -> Result<(), SyncError> {
        let user = user.unwrap_or(ANONYMOUS_USER);
        let reply = self.command(&format!("USER {user}")).await?;
        match reply.code {
            230 => Ok(()),
            331 | 332 => {
                let password = password.unwrap_or(ANONYMOUS_PASSWORD);
                let reply = self.command(&format!("PASS {password}")).await?;
                check("PASS", &reply, &[202, 230])
            }
            _ => check("USER", &reply, &[230]),
        }
    }

    /// Modification date of a remote file.
    pub async fn mdtm(&mut self, path: &str) -> Result<NaiveDate, SyncError> {
        let reply = self.expect(&format!("MDTM {path}"), &[213]).await?;
        parse_mdtm(&reply.text)
    }

    pub async fn cwd(&mut self, path: &str) -> Result<(), SyncError> {
        self.expect(&format!("CWD {path}"), &[250]).await.map(|_| ())
    }

    /// Names in the current directory.
    pub async fn nlst(&mut self) -> Result<Vec<String>, SyncError> {
        let mut data = self.passive().await?;
        self.expect("NLST", &[125, 150]).await?;
        let mut listing = String::new();
        data.read_to_string(&mut listing).await?;
        drop(data);
        let done = self.read_reply().await?;
        check("NLST", &done, &[226, 250])?;
        Ok(listing
            .lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .map(|line| line.rsplit('/').next().unwrap_or(line).to_string())
            .collect())
    }

    /// Retrieve a file in binary mode into `dest`.
    pub async fn retr(&mut self, path: &str, dest: &Path) -> Result<u64, SyncError> {
        self.expect("TYPE I", &[200]).await?;
        let mut data = self.passive().await?;
        self.expect(&format!("RETR {path}"), &[125, 150]).await?;
        let mut file = tokio::fs::File::create(dest).await?;
        let written = tokio::io::copy(&mut data, &mut file).await?;
        file.flush().await?;
        drop(data);
        let done = self.read_reply().await?;
        check("RETR", &done, &[226, 250])?;
        debug!(path, bytes = written, "FTP retrieve complete");
        Ok(written)
    }

    pub async fn quit(mut self) -> Result<(), SyncError> {
        self.command("QUIT").await.map(|_| ())
    }

    pub async fn command(&mut self, command: &str) -> Result<Reply, SyncError> {
        let shown = if command.starts_with("PASS ") {
            "PASS ****"
        } else {
            command
        };
        debug!(command = shown, "FTP send");
        self.writer
            .write_all(format!("{command}\r\n").as_bytes())
            .await?;
        self.read_reply().await
    }

    async fn expect(&mut self, command: &str, codes: &[u16]) -> Result<Reply, SyncError> {
        let reply = self.command(command).await?;
        let verb = command.split_whitespace().next().unwrap_or(command);
        check(verb, &reply, codes)?;
        Ok(reply)
    }

    /// Open a passive data connection to the control host. The address in
    /// the `PASV` reply is ignored; servers behind NAT report private ones.
    async fn passive(&mut self) -> Result<TcpStream, SyncError> {
        let reply = self.expect("PASV", &[227]).await?;
        let port = parse_pasv_port(&reply.text)?;
        Ok(TcpStream::connect((self.host.as_str(), port)).await?)
    }

    async fn read_reply(&mut self) -> Result<Reply, SyncError> {
        let first = self.read_line().await?;
        let code: u16 = first
            .get(..3)
            .and_then(|c| c.parse().ok())
            .ok_or_else(|| SyncError::FtpReply(first.clone()))?;
        let mut text = first.get(4..).unwrap_or_default().to_string();
        if first.as_bytes().get(3) == Some(&b'-') {
            let terminator = format!("{code} ");
            loop {
                let line = self.read_line().await?;
                text.push('\n');
                if let Some(rest) = line.strip_prefix(&terminator) {
                    text.push_str(rest);
                    break;
                }
                text.push_str(&line);
            }
        }
        debug!(code, text = %text, "FTP reply");
        Ok(Reply { code, text })
    }

    async fn read_line(&mut self) -> Result<String, SyncError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Err(SyncError::FtpReply("connection closed".to_string()));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

fn check(command: &str, reply: &Reply, codes: &[u16]) -> Result<(), SyncError> {
    if codes.contains(&reply.code) {
        Ok(())
    } else {
        Err(SyncError::Ftp {
            command: command.to_string(),
            code: reply.code,
            message: reply.text.clone(),
        })
    }
}

/// Parse an `MDTM` timestamp (`YYYYMMDDHHMMSS`, optional fraction) to its day.
pub fn parse_mdtm(text: &str) -> Result<NaiveDate, SyncError> {
    let stamp = text.trim();
    let whole = stamp.split('.').next().unwrap_or(stamp);
    NaiveDateTime::parse_from_str(whole, "%Y%m%d%H%M%S")
        .map(|dt| dt.date())
        .map_err(|_| SyncError::Timestamp(text.to_string()))
}

/// Port from a `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)` reply.
pub fn parse_pasv_port(text: &str) -> Result<u16, SyncError> {
    let start = text.find(|c: char| c.is_ascii_digit());
    let numbers: Vec<u16> = start
        .map(|i| &text[i..])
        .unwrap_or_default()
        .split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .take(6)
        .filter_map(|part| part.parse().ok())
        .collect();
    match numbers.as_slice() {
        [_, _, _, _, high, low] if *high < 256 && *low < 256 => Ok(high * 256 + low),
        _ => Err(SyncError::FtpReply(text.to_string())),
    }
}
