//! HTTP streaming for DrishtiIO

pub mod multipart;
pub mod server;
pub mod session;

pub use multipart::{BOUNDARY, STREAM_CONTENT_TYPE};
pub use server::{HttpServer, Routes, ServerContext, StreamStats};
pub use session::{SessionEnd, SessionOutcome, StreamSession};
