#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::net::TcpStream;
use std::sync::Mutex;
use std::thread::JoinHandle;
use std::time::Duration;

use csv_feed::RequestParams;
use csv_feed::Record;
use csv_feed::collaborators::{
    AttachmentMetadata, AttachmentService, CollaboratorError, Environment, FileMetadata, IngestionTrigger,
};

/// A server that answers exactly one request, then hands back the raw request.
pub struct OneShotServer {
    pub base_url: String,
    handle: JoinHandle<String>,
}

impl OneShotServer {
    pub fn spawn(status: u16, content_type: &str, body: &str) -> Self {
        let response = format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Type: {content_type}\r\nContent-Length: {len}\r\nConnection: close\r\n\r\n{body}",
            reason = reason(status),
            len = body.len(),
        );

        Self::spawn_raw(response, Duration::ZERO)
    }

    /// Write `response` verbatim, then keep the connection open for `hold` before closing.
    ///
    /// A response whose `Content-Length` exceeds what was written stalls the client mid-body;
    /// an empty response stalls it before the status line.
    pub fn spawn_raw(response: String, hold: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
            std::thread::sleep(hold);
            request
        });

        Self {
            base_url: format!("http://{addr}"),
            handle,
        }
    }

    /// Wait for the single request and return it in full (head and body).
    pub fn request(self) -> String {
        self.handle.join().unwrap()
    }

    /// Wait for the single request and return its request line.
    pub fn request_line(self) -> String {
        let request = self.request();
        request.lines().next().unwrap_or_default().to_string()
    }
}

/// Read one request: the head, then a `Content-Length` or chunked body when present.
fn read_request(stream: &mut TcpStream) -> String {
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    let head_end = loop {
        if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return String::from_utf8_lossy(&raw).into_owned(),
            Ok(n) => raw.extend_from_slice(&buf[..n]),
        }
    };

    let head = String::from_utf8_lossy(&raw[..head_end]).to_ascii_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok());
    let chunked = head.contains("transfer-encoding: chunked");

    loop {
        let body = &raw[head_end..];
        let complete = match content_length {
            Some(len) => body.len() >= len,
            None if chunked => body.ends_with(b"0\r\n\r\n"),
            None => true,
        };
        if complete {
            break;
        }
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => raw.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&raw).into_owned()
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

pub fn params(json: &str) -> RequestParams {
    serde_json::from_str(json).unwrap()
}

/// Attachment service backed by an in-memory CSV body.
pub struct FakeAttachments {
    pub content: String,
    pub resolved: Mutex<Vec<String>>,
    pub downloaded: Mutex<Vec<String>>,
    pub download_dirs: Mutex<Vec<PathBuf>>,
}

impl FakeAttachments {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
            resolved: Mutex::new(Vec::new()),
            downloaded: Mutex::new(Vec::new()),
            download_dirs: Mutex::new(Vec::new()),
        }
    }
}

impl AttachmentService for FakeAttachments {
    fn resolve(&self, iri: &str) -> Result<AttachmentMetadata, CollaboratorError> {
        self.resolved.lock().unwrap().push(iri.to_string());
        match iri.strip_prefix("/api/3/attachments/") {
            Some("missing") => Err(CollaboratorError::NotFound(iri.to_string())),
            Some(id) => Ok(AttachmentMetadata {
                file: FileMetadata {
                    id: format!("/api/3/files/{id}-file"),
                    filename: Some(format!("{id}.csv")),
                },
            }),
            None => Err(CollaboratorError::Malformed(iri.to_string())),
        }
    }

    fn download(&self, file_iri: &str, dest_dir: &Path) -> Result<PathBuf, CollaboratorError> {
        self.downloaded.lock().unwrap().push(file_iri.to_string());
        self.download_dirs.lock().unwrap().push(dest_dir.to_path_buf());
        let path = dest_dir.join("download.csv");
        std::fs::write(&path, &self.content)?;
        Ok(path)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerCall {
    pub records: Vec<Record>,
    pub playbook_id: Option<String>,
    pub batch_size: usize,
    pub env: Environment,
}

#[derive(Default)]
pub struct RecordingTrigger {
    pub calls: Mutex<Vec<TriggerCall>>,
}

impl IngestionTrigger for RecordingTrigger {
    fn trigger(
        &self,
        records: &[Record],
        playbook_id: Option<&str>,
        batch_size: usize,
        env: &Environment,
    ) -> Result<(), CollaboratorError> {
        self.calls.lock().unwrap().push(TriggerCall {
            records: records.to_vec(),
            playbook_id: playbook_id.map(str::to_owned),
            batch_size,
            env: env.clone(),
        });
        Ok(())
    }
}
