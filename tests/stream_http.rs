//! End-to-end tests over loopback: real listeners, real sockets
//!
//! Each test binds its own server on an ephemeral port with a mock camera
//! and a mock flash pin, then talks plain HTTP to it.

use drishti_io::devices::mock::MockCamera;
use drishti_io::flash::{DriveMode, FlashController, MockPin, PwmSettings};
use drishti_io::streaming::{HttpServer, Routes, ServerContext, StreamStats};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

struct TestServer {
    addr: SocketAddr,
    running: Arc<AtomicBool>,
    flash: Arc<FlashController>,
    flash_pin: MockPin,
    stats: Arc<StreamStats>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    fn start() -> Self {
        let camera = Arc::new(MockCamera::with_settings(2, 48, 32, 70, 9));
        let flash_pin = MockPin::new();
        let flash = Arc::new(FlashController::new(
            Box::new(flash_pin.clone()),
            DriveMode::Pwm,
            false,
            PwmSettings {
                freq_hz: 5000,
                resolution_bits: 8,
            },
        ));
        flash.force_off().unwrap();

        let running = Arc::new(AtomicBool::new(true));
        let stats = Arc::new(StreamStats::default());

        let server = HttpServer::bind("test-http", "127.0.0.1:0", Routes::all()).unwrap();
        let addr = server.local_addr().unwrap();

        let ctx = Arc::new(ServerContext {
            source: camera,
            flash: Arc::clone(&flash),
            running: Arc::clone(&running),
            stats: Arc::clone(&stats),
            frame_interval: Duration::from_millis(2),
            acquire_retries: 5,
            stream_port: addr.port(),
        });
        let handle = server.spawn(ctx).unwrap();

        Self {
            addr,
            running,
            flash,
            flash_pin,
            stats,
            handle: Some(handle),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Single-shot GET, returning the whole response as text
fn http_get(addr: SocketAddr, path: &str) -> String {
    let mut conn = TcpStream::connect(addr).unwrap();
    conn.write_all(format!("GET {} HTTP/1.1\r\nHost: test\r\n\r\n", path).as_bytes())
        .unwrap();
    let mut response = String::new();
    conn.read_to_string(&mut response).unwrap();
    response
}

/// Read one multipart part off the stream; returns its payload
fn read_part(reader: &mut BufReader<TcpStream>) -> Vec<u8> {
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    assert_eq!(line, "--frame\r\n");

    let mut content_length = None;
    loop {
        line.clear();
        reader.read_line(&mut line).unwrap();
        if line == "\r\n" {
            break;
        }
        if let Some(value) = line.trim_end().strip_prefix("Content-Length: ") {
            content_length = Some(value.parse::<usize>().unwrap());
        } else {
            assert_eq!(line.trim_end(), "Content-Type: image/jpeg");
        }
    }

    let n = content_length.expect("part carried no Content-Length");
    let mut payload = vec![0u8; n];
    reader.read_exact(&mut payload).unwrap();

    let mut delim = [0u8; 2];
    reader.read_exact(&mut delim).unwrap();
    assert_eq!(&delim, b"\r\n");
    payload
}

#[test]
fn test_stream_delivers_well_formed_jpeg_parts() {
    let srv = TestServer::start();

    let mut conn = TcpStream::connect(srv.addr).unwrap();
    conn.write_all(b"GET /stream HTTP/1.1\r\nHost: test\r\n\r\n")
        .unwrap();
    let mut reader = BufReader::new(conn);

    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    assert!(line.starts_with("HTTP/1.1 200 OK"), "got: {}", line);

    let mut saw_content_type = false;
    loop {
        line.clear();
        reader.read_line(&mut line).unwrap();
        if line == "\r\n" {
            break;
        }
        if line
            .to_ascii_lowercase()
            .starts_with("content-type:")
        {
            assert!(line.contains("multipart/x-mixed-replace"));
            assert!(line.contains("boundary=frame"));
            saw_content_type = true;
        }
    }
    assert!(saw_content_type);

    for _ in 0..3 {
        let payload = read_part(&mut reader);
        assert!(payload.len() > 4);
        assert_eq!(&payload[..2], &[0xFF, 0xD8], "missing JPEG SOI");
        assert_eq!(&payload[payload.len() - 2..], &[0xFF, 0xD9], "missing JPEG EOI");
    }

    assert!(srv.stats.sessions.load(Ordering::Relaxed) >= 1);
}

#[test]
fn test_two_viewers_stream_concurrently() {
    let srv = TestServer::start();

    let mut readers: Vec<BufReader<TcpStream>> = (0..2)
        .map(|_| {
            let mut conn = TcpStream::connect(srv.addr).unwrap();
            conn.write_all(b"GET /stream HTTP/1.1\r\nHost: test\r\n\r\n")
                .unwrap();
            let mut reader = BufReader::new(conn);
            // skip the response head
            let mut line = String::new();
            loop {
                line.clear();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" {
                    break;
                }
            }
            reader
        })
        .collect();

    // both sessions make progress against the two-buffer pool
    for reader in readers.iter_mut() {
        for _ in 0..2 {
            let payload = read_part(reader);
            assert_eq!(&payload[..2], &[0xFF, 0xD8]);
        }
    }
}

#[test]
fn test_toggle_flash_round_trip() {
    let srv = TestServer::start();
    assert!(!srv.flash.is_on());

    let response = http_get(srv.addr, "/toggle_flash");
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.ends_with("OK"));
    assert!(srv.flash.is_on());
    assert!(srv.flash_pin.attached());

    let response = http_get(srv.addr, "/toggle_flash");
    assert!(response.ends_with("OK"));
    assert!(!srv.flash.is_on());
    assert!(!srv.flash_pin.attached());
}

#[test]
fn test_index_page_served() {
    let srv = TestServer::start();
    let response = http_get(srv.addr, "/");
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.contains("text/html"));
    assert!(response.contains("/stream"));
    assert!(response.contains("/toggle_flash"));
}

#[test]
fn test_unknown_path_is_404() {
    let srv = TestServer::start();
    let response = http_get(srv.addr, "/snapshot");
    assert!(response.starts_with("HTTP/1.1 404 Not Found"));
}

#[test]
fn test_non_get_is_405() {
    let srv = TestServer::start();
    let mut conn = TcpStream::connect(srv.addr).unwrap();
    conn.write_all(b"POST /toggle_flash HTTP/1.1\r\nHost: test\r\nContent-Length: 0\r\n\r\n")
        .unwrap();
    let mut response = String::new();
    conn.read_to_string(&mut response).unwrap();
    assert!(response.starts_with("HTTP/1.1 405"));
}
