//! HTTP listener and request routing
//!
//! One canonical server component covers both deployment layouts of the
//! original module firmware: a dedicated streaming listener beside a control
//! listener (ports 81 and 80), or a single listener serving every route.
//! Which paths a listener answers is a [`Routes`] value, not a separate
//! server implementation.
//!
//! The accept loop is non-blocking with a short idle sleep so it can observe
//! the shutdown flag; each accepted connection gets its own named worker
//! thread. Request parsing is deliberately minimal: read the request head
//! (bounded, with a read timeout), take the method and path, dispatch.

use crate::core::FrameSource;
use crate::error::{Error, Result};
use crate::flash::FlashController;
use crate::streaming::session::StreamSession;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Upper bound on an accepted request head (GET requests only; no bodies)
const MAX_REQUEST_HEAD: usize = 8 * 1024;

/// How long a connection may dribble its request head before being dropped
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Counters shared by every listener, logged periodically by the main loop
#[derive(Debug, Default)]
pub struct StreamStats {
    pub sessions: AtomicU64,
    pub frames: AtomicU64,
}

/// Which paths a listener answers
#[derive(Debug, Clone, Copy)]
pub struct Routes {
    pub index: bool,
    pub stream: bool,
    pub flash: bool,
}

impl Routes {
    /// Every route on one listener
    pub fn all() -> Self {
        Self {
            index: true,
            stream: true,
            flash: true,
        }
    }

    /// Streaming endpoint only
    pub fn stream_only() -> Self {
        Self {
            index: false,
            stream: true,
            flash: false,
        }
    }

    /// Index page and flash control only
    pub fn control_only() -> Self {
        Self {
            index: true,
            stream: false,
            flash: true,
        }
    }
}

/// Shared handler state
pub struct ServerContext {
    pub source: Arc<dyn FrameSource>,
    pub flash: Arc<FlashController>,
    pub running: Arc<AtomicBool>,
    pub stats: Arc<StreamStats>,
    /// Minimum inter-frame delay for streaming sessions
    pub frame_interval: Duration,
    /// Consecutive failed acquires a session tolerates
    pub acquire_retries: u32,
    /// Port the index page points its stream image at
    pub stream_port: u16,
}

/// A bound listener plus its route set
pub struct HttpServer {
    name: &'static str,
    listener: TcpListener,
    routes: Routes,
}

impl HttpServer {
    /// Bind a listener
    pub fn bind(name: &'static str, addr: &str, routes: Routes) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .map_err(|e| Error::Other(format!("Failed to bind {} to {}: {}", name, addr, e)))?;
        listener.set_nonblocking(true)?;
        Ok(Self {
            name,
            listener,
            routes,
        })
    }

    /// Address actually bound (resolves port 0 to the assigned port)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Start the accept loop on its own named thread
    pub fn spawn(self, ctx: Arc<ServerContext>) -> Result<JoinHandle<()>> {
        let name = self.name;
        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || self.accept_loop(ctx))
            .map_err(|e| Error::Other(format!("Failed to spawn {}: {}", name, e)))
    }

    fn accept_loop(self, ctx: Arc<ServerContext>) {
        match self.listener.local_addr() {
            Ok(addr) => log::info!("{} listening on {}", self.name, addr),
            Err(_) => log::info!("{} listening", self.name),
        }

        while ctx.running.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    // The listener is non-blocking; connections must not be
                    if let Err(e) = stream.set_nonblocking(false) {
                        log::warn!("Failed to set blocking mode for {}: {}", peer, e);
                        continue;
                    }
                    let routes = self.routes;
                    let conn_ctx = Arc::clone(&ctx);
                    let spawned = thread::Builder::new()
                        .name("http-conn".to_string())
                        .spawn(move || handle_connection(stream, peer, routes, &conn_ctx));
                    if let Err(e) = spawned {
                        log::error!("Failed to spawn connection thread: {}", e);
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    // No connection pending; stay responsive to shutdown
                    thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    log::error!("{}: accept error: {}", self.name, e);
                }
            }
        }

        log::info!("{} stopped", self.name);
    }
}

struct RequestHead {
    method: String,
    target: String,
}

/// Read and parse the request line; the rest of the head is discarded
fn read_request_head(stream: &mut TcpStream) -> Result<RequestHead> {
    let mut buf = Vec::with_capacity(512);
    let mut chunk = [0u8; 512];
    loop {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Err(Error::InvalidRequest(
                "connection closed before request head".to_string(),
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
        if buf.len() > MAX_REQUEST_HEAD {
            return Err(Error::InvalidRequest("request head too large".to_string()));
        }
    }

    let head = String::from_utf8_lossy(&buf);
    let request_line = head
        .lines()
        .next()
        .ok_or_else(|| Error::InvalidRequest("empty request".to_string()))?;
    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| Error::InvalidRequest("missing method".to_string()))?
        .to_string();
    let target = parts
        .next()
        .ok_or_else(|| Error::InvalidRequest("missing request target".to_string()))?;
    // ignore any query string
    let target = target.split('?').next().unwrap_or(target).to_string();

    Ok(RequestHead { method, target })
}

fn handle_connection(mut stream: TcpStream, peer: SocketAddr, routes: Routes, ctx: &ServerContext) {
    if let Err(e) = stream.set_read_timeout(Some(REQUEST_READ_TIMEOUT)) {
        log::warn!("Failed to set read timeout for {}: {}", peer, e);
    }

    let head = match read_request_head(&mut stream) {
        Ok(head) => head,
        Err(e) => {
            log::debug!("{}: dropping connection: {}", peer, e);
            return;
        }
    };
    log::debug!("{}: {} {}", peer, head.method, head.target);

    if head.method != "GET" {
        respond(&mut stream, "405 Method Not Allowed", "text/plain", b"GET only");
        return;
    }

    match head.target.as_str() {
        "/stream" if routes.stream => {
            let _ = stream.set_nodelay(true);
            ctx.stats.sessions.fetch_add(1, Ordering::Relaxed);
            let session = StreamSession::new(
                stream,
                peer.to_string(),
                ctx.frame_interval,
                ctx.acquire_retries,
                Arc::clone(&ctx.running),
            );
            let outcome = session.run(ctx.source.as_ref());
            ctx.stats.frames.fetch_add(outcome.frames, Ordering::Relaxed);
        }
        "/" if routes.index => {
            let page = index_page(ctx.stream_port);
            respond(&mut stream, "200 OK", "text/html", page.as_bytes());
        }
        "/toggle_flash" if routes.flash => match ctx.flash.toggle() {
            Ok(_) => respond(&mut stream, "200 OK", "text/plain", b"OK"),
            Err(e) => {
                log::error!("{}: flash toggle failed: {}", peer, e);
                respond(
                    &mut stream,
                    "500 Internal Server Error",
                    "text/plain",
                    b"flash error",
                );
            }
        },
        _ => {
            respond(&mut stream, "404 Not Found", "text/plain", b"not found");
        }
    }
}

/// Write a short single-shot response and close
fn respond(stream: &mut TcpStream, status: &str, content_type: &str, body: &[u8]) {
    let header = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    let result = stream
        .write_all(header.as_bytes())
        .and_then(|_| stream.write_all(body));
    if let Err(e) = result {
        log::debug!("Response write failed: {}", e);
    }
}

/// Viewer page: live image plus a flash toggle button
///
/// The stream URL is derived from the page's own hostname and the configured
/// stream port, so the page works unchanged whether streaming shares the
/// control listener or runs on its own port.
fn index_page(stream_port: u16) -> String {
    const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>DrishtiIO</title>
    <style>
      body { text-align:center; background:#111; color:#fff; font-family:Arial,sans-serif; }
      img { width:90%; max-width:640px; border-radius:8px; margin-top:12px; }
      button { margin-top:12px; padding:10px 20px; font-size:16px; border-radius:8px;
               border:none; background:#0078ff; color:#fff; cursor:pointer; }
      button.on { background:#00b400; }
    </style>
  </head>
  <body>
    <h2>DrishtiIO Live Stream</h2>
    <img id="stream">
    <br>
    <button id="flashBtn" onclick="toggleFlash()">Flash</button>
    <script>
      const img = document.getElementById('stream');
      img.src = location.protocol + '//' + location.hostname + ':' + STREAM_PORT + '/stream';
      let flashOn = false;
      function toggleFlash() {
        fetch('/toggle_flash').then(() => {
          flashOn = !flashOn;
          document.getElementById('flashBtn').classList.toggle('on', flashOn);
        });
      }
    </script>
  </body>
</html>
"#;
    TEMPLATE.replace("STREAM_PORT", &stream_port.to_string())
}
