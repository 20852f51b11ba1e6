//! Minimal HTTP/1.1 image server for integration tests.
//!
//! Accepts `POST /upload` with a multipart `file` part and serves the stored
//! bytes back on `GET /download/{id}`. Options force failure statuses or
//! corrupt downloads; counters record which endpoints were hit.

#![allow(dead_code)]

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct ImageServerOptions {
    /// Answer every upload with this status (and a short error body).
    pub upload_status: Option<u16>,
    /// Answer every download with this status.
    pub download_status: Option<u16>,
    /// Flip the first byte (or add one) on download.
    pub tamper_download: bool,
    /// Announce a longer Content-Length than the download body, then hang up.
    pub truncate_download: bool,
    /// Hand out this id instead of the content hash.
    pub fixed_id: Option<String>,
    /// Raw 200 body for uploads; `{id}` is replaced with the assigned id.
    pub upload_body: Option<String>,
}

/// One multipart part as the server received it.
#[derive(Debug, Clone)]
pub struct ReceivedPart {
    pub field_name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Default)]
struct State {
    images: Mutex<HashMap<String, ReceivedPart>>,
    last_upload: Mutex<Option<ReceivedPart>>,
    uploads: AtomicUsize,
    downloads: AtomicUsize,
}

pub struct ImageServer {
    pub base_url: String,
    state: Arc<State>,
}

impl ImageServer {
    pub fn upload_count(&self) -> usize {
        self.state.uploads.load(Ordering::SeqCst)
    }

    pub fn download_count(&self) -> usize {
        self.state.downloads.load(Ordering::SeqCst)
    }

    pub fn last_upload(&self) -> Option<ReceivedPart> {
        self.state.last_upload.lock().unwrap().clone()
    }

    /// Put an image in the store directly, bypassing `/upload`.
    pub fn insert(&self, id: &str, data: &[u8]) {
        self.state.images.lock().unwrap().insert(
            id.to_string(),
            ReceivedPart {
                field_name: "file".to_string(),
                filename: Some("seeded.png".to_string()),
                content_type: Some("image/png".to_string()),
                data: data.to_vec(),
            },
        );
    }
}

/// Starts a well-behaved server on an ephemeral port. Runs until the process exits.
pub fn start() -> ImageServer {
    start_with_options(ImageServerOptions::default())
}

pub fn start_with_options(opts: ImageServerOptions) -> ImageServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let state = Arc::new(State::default());
    let server_state = Arc::clone(&state);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let state = Arc::clone(&server_state);
            let opts = opts.clone();
            thread::spawn(move || handle(stream, &state, &opts));
        }
    });
    ImageServer {
        base_url: format!("http://127.0.0.1:{}", port),
        state,
    }
}

/// A base URL nothing listens on.
pub fn unused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

struct Request {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Request {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn handle(mut stream: TcpStream, state: &State, opts: &ImageServerOptions) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let req = match read_request(&mut stream) {
        Some(r) => r,
        None => return,
    };
    match (req.method.as_str(), req.path.as_str()) {
        ("POST", "/upload") => handle_upload(&mut stream, &req, state, opts),
        ("GET", p) if p.starts_with("/download/") => {
            let id = &p["/download/".len()..];
            handle_download(&mut stream, id, state, opts)
        }
        _ => respond(&mut stream, 404, &[], b"no such route"),
    }
}

fn handle_upload(stream: &mut TcpStream, req: &Request, state: &State, opts: &ImageServerOptions) {
    state.uploads.fetch_add(1, Ordering::SeqCst);
    if let Some(code) = opts.upload_status {
        respond(stream, code, &[], b"upload refused by test server");
        return;
    }
    let boundary = match req.header("content-type").and_then(boundary_of) {
        Some(b) => b,
        None => {
            respond(stream, 400, &[], b"expected multipart/form-data");
            return;
        }
    };
    let part = match parse_first_part(&req.body, &boundary) {
        Some(p) => p,
        None => {
            respond(stream, 400, &[], b"No file uploaded");
            return;
        }
    };
    let id = opts
        .fixed_id
        .clone()
        .unwrap_or_else(|| hex::encode(Sha256::digest(&part.data)));
    *state.last_upload.lock().unwrap() = Some(part.clone());
    state.images.lock().unwrap().insert(id.clone(), part);
    let body = match &opts.upload_body {
        Some(template) => template.replace("{id}", &id),
        None => format!("\"{}\"", id),
    };
    respond(
        stream,
        200,
        &[("Content-Type", "application/json".to_string())],
        body.as_bytes(),
    );
}

fn handle_download(stream: &mut TcpStream, id: &str, state: &State, opts: &ImageServerOptions) {
    state.downloads.fetch_add(1, Ordering::SeqCst);
    if let Some(code) = opts.download_status {
        respond(stream, code, &[], b"download refused by test server");
        return;
    }
    let stored = state.images.lock().unwrap().get(id).cloned();
    let part = match stored {
        Some(p) => p,
        None => {
            respond(stream, 404, &[], b"No such file or directory");
            return;
        }
    };
    let mut data = part.data;
    if opts.tamper_download {
        match data.first_mut() {
            Some(b) => *b ^= 0xff,
            None => data.push(0),
        }
    }
    let filename = part.filename.unwrap_or_else(|| "unknown".to_string());
    let content_type = part
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let announced = if opts.truncate_download {
        data.len() + 16
    } else {
        data.len()
    };
    respond_announcing(
        stream,
        200,
        &[
            ("Content-Type", content_type),
            (
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        &data,
        announced,
    );
}

fn respond(stream: &mut TcpStream, code: u16, headers: &[(&str, String)], body: &[u8]) {
    respond_announcing(stream, code, headers, body, body.len())
}

fn respond_announcing(
    stream: &mut TcpStream,
    code: u16,
    headers: &[(&str, String)],
    body: &[u8],
    content_length: usize,
) {
    let reason = match code {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    };
    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        code,
        reason,
        content_length
    );
    for (k, v) in headers {
        head.push_str(&format!("{}: {}\r\n", k, v));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 8192];
    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = std::str::from_utf8(&buf[..header_end]).ok()?;
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let mut req = Request {
        method,
        path,
        headers,
        body: buf[header_end + 4..].to_vec(),
    };

    if req
        .header("expect")
        .map(|v| v.eq_ignore_ascii_case("100-continue"))
        .unwrap_or(false)
    {
        let _ = stream.write_all(b"HTTP/1.1 100 Continue\r\n\r\n");
    }

    let content_length = req
        .header("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    while req.body.len() < content_length {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        req.body.extend_from_slice(&chunk[..n]);
    }
    Some(req)
}

fn boundary_of(content_type: &str) -> Option<String> {
    if !content_type
        .to_ascii_lowercase()
        .starts_with("multipart/form-data")
    {
        return None;
    }
    content_type.split(';').find_map(|p| {
        let (k, v) = p.split_once('=')?;
        if k.trim().eq_ignore_ascii_case("boundary") {
            Some(v.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

fn parse_first_part(body: &[u8], boundary: &str) -> Option<ReceivedPart> {
    let open = format!("--{}\r\n", boundary);
    let start = find(body, open.as_bytes())? + open.len();
    let rest = &body[start..];
    let header_end = find(rest, b"\r\n\r\n")?;
    let head = std::str::from_utf8(&rest[..header_end]).ok()?;
    let data_start = header_end + 4;
    let close = format!("\r\n--{}", boundary);
    let data_len = find(&rest[data_start..], close.as_bytes())?;
    let data = rest[data_start..data_start + data_len].to_vec();

    let mut field_name = None;
    let mut filename = None;
    let mut content_type = None;
    for line in head.split("\r\n") {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("content-disposition") {
            for param in value.split(';') {
                if let Some((k, v)) = param.split_once('=') {
                    let v = v.trim().trim_matches('"').to_string();
                    match k.trim() {
                        "name" => field_name = Some(v),
                        "filename" => filename = Some(v),
                        _ => {}
                    }
                }
            }
        } else if name.trim().eq_ignore_ascii_case("content-type") {
            content_type = Some(value.trim().to_string());
        }
    }
    Some(ReceivedPart {
        field_name: field_name?,
        filename,
        content_type,
        data,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
