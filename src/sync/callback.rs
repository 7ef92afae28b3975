//! OAuth redirect handshake. The backend finishes the Google exchange and
//! redirects the browser to the client with `?user_id=..&auth=success` (or
//! `?error=..`). The terminal client receives that redirect on a loopback
//! listener.

use crate::sync::token::AuthToken;
use chrono::{DateTime, Duration, Local};
use reqwest::Url;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration as StdDuration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const PARAM_USER_ID: &str = "user_id";
pub const PARAM_AUTH: &str = "auth";
pub const PARAM_ERROR: &str = "error";
const AUTH_SUCCESS: &str = "success";
const CALLBACK_PARAMS: [&str; 4] = [PARAM_USER_ID, PARAM_AUTH, PARAM_ERROR, "error_description"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OAuthCallback {
    Success(AuthToken),
    Failed(String),
    /// No (complete) handshake markers in the URL.
    Absent,
}

pub fn parse_callback(url: &Url) -> OAuthCallback {
    let mut user_id = None;
    let mut auth = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            PARAM_USER_ID => user_id = Some(value.into_owned()),
            PARAM_AUTH => auth = Some(value.into_owned()),
            PARAM_ERROR => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return OAuthCallback::Failed(error);
    }
    match (auth.as_deref(), user_id.and_then(AuthToken::new)) {
        (Some(AUTH_SUCCESS), Some(token)) => OAuthCallback::Success(token),
        _ => OAuthCallback::Absent,
    }
}

pub fn has_callback_params(url: &Url) -> bool {
    url.query_pairs()
        .any(|(key, _)| CALLBACK_PARAMS.contains(&key.as_ref()))
}

/// Same URL without the handshake parameters; unrelated query pairs survive.
pub fn strip_callback_params(url: &Url) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !CALLBACK_PARAMS.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut cleaned = url.clone();
    cleaned.set_query(None);
    if !kept.is_empty() {
        cleaned.query_pairs_mut().extend_pairs(kept);
    }
    cleaned
}

#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("cannot listen on port {port}: {source}")]
    Bind { port: u16, source: io::Error },
    #[error("callback listener failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Clone, Debug)]
pub enum CallbackPoll {
    Received(Url),
    Error(String),
}

#[derive(Clone, Debug)]
pub struct CallbackDisplay {
    pub local_url: String,
    pub login_url: String,
    pub expires_at: DateTime<Local>,
}

pub struct CallbackListener {
    pub display: CallbackDisplay,
    listener: TcpListener,
    addr: SocketAddr,
}

impl CallbackListener {
    pub fn bind(port: u16, login_url: &str, timeout_seconds: u64) -> Result<Self, CallbackError> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port))
            .map_err(|source| CallbackError::Bind { port, source })?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;
        Ok(Self {
            display: CallbackDisplay {
                local_url: format!("http://{addr}/"),
                login_url: login_url.to_string(),
                expires_at: Local::now() + Duration::seconds(timeout_seconds as i64),
            },
            listener,
            addr,
        })
    }
}

/// Waits on a background thread for the redirect carrying the handshake
/// parameters. Other requests (favicon, prefetch) get a 404 and are skipped.
pub fn spawn_callback_wait(listener: CallbackListener) -> Receiver<CallbackPoll> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        loop {
            if Local::now() >= listener.display.expires_at {
                let _ = tx.send(CallbackPoll::Error(
                    "Google sign-in expired. Please retry.".to_string(),
                ));
                return;
            }

            match listener.listener.accept() {
                Ok((mut stream, _peer)) => match read_callback(&mut stream, listener.addr) {
                    Ok(Some(url)) => {
                        let _ = respond(
                            &mut stream,
                            "200 OK",
                            "Jarvis received your Google sign-in. You can close this window.",
                        );
                        info!(path = url.path(), "oauth redirect received");
                        let _ = tx.send(CallbackPoll::Received(url));
                        return;
                    }
                    Ok(None) => {
                        let _ = respond(&mut stream, "404 Not Found", "Not found.");
                    }
                    Err(e) => {
                        debug!(error = %e, "ignoring malformed callback request");
                    }
                },
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(StdDuration::from_millis(200));
                }
                Err(e) => {
                    warn!(error = %e, "callback listener stopped");
                    let _ = tx.send(CallbackPoll::Error(e.to_string()));
                    return;
                }
            }
        }
    });

    rx
}

fn read_callback(stream: &mut TcpStream, addr: SocketAddr) -> io::Result<Option<Url>> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(StdDuration::from_secs(2)))?;
    let mut reader = BufReader::new(&mut *stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    // Drain the headers so closing the socket does not reset the connection.
    let mut header = String::new();
    while reader.read_line(&mut header)? > 0 && !header.trim().is_empty() {
        header.clear();
    }

    let target = request_line.split_whitespace().nth(1).unwrap_or("/");
    let url = Url::parse(&format!("http://{addr}{target}"))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(has_callback_params(&url).then_some(url))
}

fn respond(stream: &mut TcpStream, status: &str, message: &str) -> io::Result<()> {
    let body = format!("{message}\n");
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(response.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn success_requires_marker_and_user_id() {
        assert_eq!(
            parse_callback(&url("http://localhost:5173/?user_id=abc123&auth=success")),
            OAuthCallback::Success(AuthToken::new("abc123").unwrap())
        );
        assert_eq!(
            parse_callback(&url("http://localhost:5173/?user_id=abc123")),
            OAuthCallback::Absent
        );
        assert_eq!(
            parse_callback(&url("http://localhost:5173/?auth=success&user_id=")),
            OAuthCallback::Absent
        );
        assert_eq!(parse_callback(&url("http://localhost:5173/")), OAuthCallback::Absent);
    }

    #[test]
    fn error_marker_wins() {
        assert_eq!(
            parse_callback(&url("http://localhost:5173/?error=access_denied&auth=success&user_id=x")),
            OAuthCallback::Failed("access_denied".to_string())
        );
    }

    #[test]
    fn user_id_is_percent_decoded() {
        assert_eq!(
            parse_callback(&url("http://localhost:5173/?auth=success&user_id=a%2Bb%20c")),
            OAuthCallback::Success(AuthToken::new("a+b c").unwrap())
        );
    }

    #[test]
    fn strip_removes_only_handshake_params() {
        let cleaned = strip_callback_params(&url(
            "http://localhost:5173/app?user_id=abc123&auth=success",
        ));
        assert_eq!(cleaned.as_str(), "http://localhost:5173/app");
        assert_eq!(cleaned.query(), None);

        let kept = strip_callback_params(&url(
            "http://localhost:5173/?tab=calendar&error=access_denied",
        ));
        assert_eq!(kept.as_str(), "http://localhost:5173/?tab=calendar");
        assert!(!has_callback_params(&kept));
    }

    #[test]
    fn listener_delivers_the_callback_url() {
        let listener =
            CallbackListener::bind(0, "http://localhost:8080/auth/google/login", 30).expect("bind");
        let addr = listener.addr;
        assert!(listener.display.local_url.starts_with("http://127.0.0.1:"));
        let rx = spawn_callback_wait(listener);

        // A stray request first; the listener must keep waiting.
        let mut stray = TcpStream::connect(addr).expect("connect");
        stray
            .write_all(b"GET /favicon.ico HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .expect("write");
        let mut response = String::new();
        stray.read_to_string(&mut response).expect("read");
        assert!(response.starts_with("HTTP/1.1 404"));

        let mut stream = TcpStream::connect(addr).expect("connect");
        stream
            .write_all(b"GET /?user_id=abc123&auth=success HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .expect("write");
        let mut response = String::new();
        stream.read_to_string(&mut response).expect("read");
        assert!(response.starts_with("HTTP/1.1 200 OK"));

        match rx.recv_timeout(StdDuration::from_secs(5)).expect("poll") {
            CallbackPoll::Received(url) => assert_eq!(
                parse_callback(&url),
                OAuthCallback::Success(AuthToken::new("abc123").unwrap())
            ),
            CallbackPoll::Error(e) => panic!("unexpected error: {e}"),
        }
    }
}
