//! Local stand-in for the statistics backend, used by the async tests.
//!
//! Runs as tasks on the calling test's tokio runtime. Every response closes
//! its connection, so no request ever waits behind another on a reused
//! socket.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use reqwest::{StatusCode, Url};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
};

const HANG_FOR: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub enum Reply {
    Body {
        status: u16,
        body: String,
        content_type: &'static str,
    },
    /// Never answers within any reasonable test timeout.
    Hang,
    /// Hangs on the first hit, answers 200 with the JSON body afterwards.
    HangOnce(String),
}

impl Reply {
    pub fn json(status: u16, body: &str) -> Self {
        Reply::Body {
            status,
            body: body.to_string(),
            content_type: "application/json",
        }
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Reply::Body {
            status,
            body: body.to_string(),
            content_type: "text/plain",
        }
    }
}

type Routes = Arc<HashMap<String, Reply>>;
type Hits = Arc<Mutex<HashMap<String, usize>>>;

pub struct MockUpstream {
    base: Url,
    hits: Hits,
}

impl MockUpstream {
    /// Bind an ephemeral port and start answering. Must be called inside a
    /// tokio runtime; the server stops when that runtime shuts down.
    pub fn start(routes: Vec<(&str, Reply)>) -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind mock upstream");
        listener
            .set_nonblocking(true)
            .expect("non-blocking mock listener");
        let port = listener.local_addr().expect("mock upstream address").port();
        let listener = TcpListener::from_std(listener).expect("register mock listener");
        let base = Url::parse(&format!("http://127.0.0.1:{port}/")).expect("mock base url");

        let routes: Routes = Arc::new(
            routes
                .into_iter()
                .map(|(path, reply)| (path.to_string(), reply))
                .collect(),
        );
        let hits: Hits = Arc::default();
        tokio::spawn(accept_loop(listener, routes, Arc::clone(&hits)));

        Self { base, hits }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn url(&self, path: &str) -> Url {
        self.base
            .join(path.trim_start_matches('/'))
            .expect("mock route url")
    }

    pub fn hits(&self, path: &str) -> usize {
        self.hits
            .lock()
            .expect("hits lock")
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.hits.lock().expect("hits lock").values().sum()
    }
}

async fn accept_loop(listener: TcpListener, routes: Routes, hits: Hits) {
    while let Ok((stream, _)) = listener.accept().await {
        tokio::spawn(answer(stream, Arc::clone(&routes), Arc::clone(&hits)));
    }
}

async fn answer(stream: TcpStream, routes: Routes, hits: Hits) {
    let mut reader = BufReader::new(stream);
    let Some(path) = read_request_path(&mut reader).await else {
        return;
    };

    let hit = {
        let mut hits = hits.lock().expect("hits lock");
        let count = hits.entry(path.clone()).or_insert(0);
        *count += 1;
        *count
    };

    let (status, body, content_type) = match routes.get(&path).cloned() {
        None => (404, r#"{"error":"not found"}"#.to_string(), "application/json"),
        Some(Reply::Body {
            status,
            body,
            content_type,
        }) => (status, body, content_type),
        Some(Reply::Hang) => {
            tokio::time::sleep(HANG_FOR).await;
            (200, "{}".to_string(), "application/json")
        }
        Some(Reply::HangOnce(body)) => {
            if hit == 1 {
                tokio::time::sleep(HANG_FOR).await;
            }
            (200, body, "application/json")
        }
    };

    let reason = StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown");
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: {content_type}\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n{body}",
        body.len()
    );

    let mut stream = reader.into_inner();
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Path of the request line with any query dropped, once the headers have
/// been read in full.
async fn read_request_path(reader: &mut BufReader<TcpStream>) -> Option<String> {
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).await.ok()? == 0 {
        return None;
    }
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await.ok()? == 0 {
            return None;
        }
        if line.trim_end().is_empty() {
            break;
        }
    }

    let target = request_line.split_whitespace().nth(1)?;
    Some(target.split('?').next().unwrap_or(target).to_string())
}
