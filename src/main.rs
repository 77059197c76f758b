//! DrishtiIO - Camera streaming daemon
//!
//! ## Service Architecture
//!
//! - **Streaming listener (port 81)**: long-lived `multipart/x-mixed-replace`
//!   responses, one worker thread per viewer
//! - **Control listener (port 80)**: index page and flash toggle, single-shot
//!   requests
//!
//! Configuring both listeners to the same address collapses them into one
//! listener serving every route. Network identity (static address, gateway,
//! netmask) is provisioned outside the daemon and only logged at startup.

use drishti_io::config::AppConfig;
use drishti_io::error::{Error, Result};
use drishti_io::flash::{create_controller, FlashController};
use drishti_io::streaming::{HttpServer, Routes, ServerContext, StreamStats};
use drishti_io::{devices, FrameSource};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Parse config path from command line arguments.
///
/// Supports:
/// - `drishti-io <path>` (positional)
/// - `drishti-io --config <path>` (flag-based)
/// - `drishti-io -c <path>` (short flag)
///
/// Defaults to `/etc/drishtiio.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    // Look for --config or -c flag
    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    // Fall back to first positional argument (if it doesn't start with -)
    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    // Default path
    "/etc/drishtiio.toml".to_string()
}

fn init_logger(config: &AppConfig) {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    );
    if config.logging.output == "stdout" {
        builder.target(env_logger::Target::Stdout);
    }
    builder.init();
}

fn main() -> Result<()> {
    // Get config path from args or default
    let config_path = parse_config_path();
    let config = AppConfig::from_file(&config_path)?;

    init_logger(&config);
    log::info!("DrishtiIO v{} starting...", env!("CARGO_PKG_VERSION"));
    log::info!("Using config: {}", config_path);
    log::info!(
        "Network identity: {} (gateway {}, netmask {}) - provisioned externally",
        config.network.address,
        config.network.gateway,
        config.network.netmask
    );

    // Create frame source
    log::info!(
        "Camera source: {} ({} frame buffers)",
        config.camera.source,
        config.camera.buffer_count
    );
    let source: Arc<dyn FrameSource> = devices::create_camera(&config.camera)?;

    // Flash output: reach a known "off" state before any request is served
    log::info!(
        "Flash output: GPIO {} via {} backend, {} drive",
        config.flash.gpio,
        config.flash.backend,
        config.flash.drive
    );
    let flash: Arc<FlashController> = Arc::new(create_controller(&config.flash)?);
    flash.force_off()?;

    // Set up shutdown signal handler
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    // Bind listeners. Equal addresses mean one listener serves every route.
    let single_listener = config.server.stream_address == config.server.control_address;
    let stats = Arc::new(StreamStats::default());

    let (stream_server, control_server) = if single_listener {
        let server = HttpServer::bind("http-server", &config.server.stream_address, Routes::all())?;
        (server, None)
    } else {
        let stream = HttpServer::bind(
            "stream-server",
            &config.server.stream_address,
            Routes::stream_only(),
        )?;
        let control = HttpServer::bind(
            "control-server",
            &config.server.control_address,
            Routes::control_only(),
        )?;
        (stream, Some(control))
    };

    let stream_port = stream_server.local_addr()?.port();
    let ctx = Arc::new(ServerContext {
        source,
        flash,
        running: Arc::clone(&running),
        stats: Arc::clone(&stats),
        frame_interval: Duration::from_millis(config.camera.frame_interval_ms),
        acquire_retries: config.camera.acquire_retries,
        stream_port,
    });

    let _stream_handle = stream_server.spawn(Arc::clone(&ctx))?;
    let _control_handle = match control_server {
        Some(server) => Some(server.spawn(Arc::clone(&ctx))?),
        None => None,
    };

    if single_listener {
        log::info!("Serving /, /stream and /toggle_flash on one listener");
    } else {
        log::info!(
            "Serving /stream on {} and /, /toggle_flash on {}",
            config.server.stream_address,
            config.server.control_address
        );
    }
    log::info!("DrishtiIO running. Press Ctrl-C to stop.");

    // Main loop - keep alive while streaming, print statistics periodically
    let mut last_stats = Instant::now();
    while running.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(100));

        if last_stats.elapsed().as_secs() >= 10 {
            log::info!(
                "Stats: {} sessions started, {} frames streamed",
                stats.sessions.load(Ordering::Relaxed),
                stats.frames.load(Ordering::Relaxed)
            );
            last_stats = Instant::now();
        }
    }

    // Shutdown: listeners and sessions observe the flag; give them a moment
    log::info!("Shutting down...");
    thread::sleep(Duration::from_millis(200));
    log::info!("DrishtiIO stopped");
    Ok(())
}
