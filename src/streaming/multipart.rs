//! Multipart stream formatting
//!
//! # Stream layout
//!
//! A live feed is one HTTP response that never completes, carrying
//! successive JPEG parts separated by a boundary token:
//!
//! ```text
//! HTTP/1.1 200 OK
//! Content-Type: multipart/x-mixed-replace;boundary=frame
//!
//! --frame\r\n
//! Content-Type: image/jpeg\r\n
//! Content-Length: <n>\r\n
//! \r\n
//! <n payload bytes>\r\n
//! --frame\r\n
//! ...
//! ```
//!
//! `Content-Length` always equals the exact payload length; a consumer may
//! rely on it to frame the part without scanning for the boundary. The
//! formatter keeps no state between parts, so a session calls it once per
//! frame with nothing but the active connection.
//!
//! Each part is exactly four writes (boundary, header block, payload,
//! trailing delimiter); header blocks are formatted into a growable string,
//! never a fixed scratch buffer.

use crate::core::FrameBuffer;
use crate::error::Result;
use std::io::Write;

/// Boundary token separating stream parts
pub const BOUNDARY: &str = "frame";

/// Content type announced by the streaming response
pub const STREAM_CONTENT_TYPE: &str = "multipart/x-mixed-replace;boundary=frame";

/// Write the response header that opens a streaming session
pub fn write_stream_header<W: Write>(conn: &mut W) -> Result<()> {
    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nCache-Control: no-store\r\nConnection: close\r\n\r\n",
        STREAM_CONTENT_TYPE
    );
    conn.write_all(header.as_bytes())?;
    Ok(())
}

/// Write one frame as one part: boundary, headers, payload, trailing delimiter
pub fn write_part<W: Write>(conn: &mut W, frame: &FrameBuffer) -> Result<()> {
    conn.write_all(b"--frame\r\n")?;
    let headers = format!(
        "Content-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        frame.len()
    );
    conn.write_all(headers.as_bytes())?;
    conn.write_all(frame.as_bytes())?;
    conn.write_all(b"\r\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(bytes: &[u8]) -> FrameBuffer {
        FrameBuffer::from_vec(bytes.to_vec())
    }

    /// Parse one encoded part back out: (declared length, payload)
    fn parse_part(encoded: &[u8]) -> (usize, Vec<u8>) {
        let text_end = encoded
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("header terminator");
        let head = std::str::from_utf8(&encoded[..text_end]).unwrap();
        let mut lines = head.split("\r\n");
        assert_eq!(lines.next(), Some("--frame"));
        assert_eq!(lines.next(), Some("Content-Type: image/jpeg"));
        let len_line = lines.next().unwrap();
        let declared: usize = len_line
            .strip_prefix("Content-Length: ")
            .unwrap()
            .parse()
            .unwrap();
        let payload_start = text_end + 4;
        let payload = encoded[payload_start..payload_start + declared].to_vec();
        assert_eq!(&encoded[payload_start + declared..], b"\r\n");
        (declared, payload)
    }

    #[test]
    fn test_part_layout() {
        let mut out = Vec::new();
        write_part(&mut out, &frame(b"jpegdata")).unwrap();
        assert_eq!(
            out,
            b"--frame\r\nContent-Type: image/jpeg\r\nContent-Length: 8\r\n\r\njpegdata\r\n"
        );
    }

    #[test]
    fn test_content_length_matches_payload_exactly() {
        for payload in [&b""[..], &b"x"[..], &[0u8; 4096][..]] {
            let mut out = Vec::new();
            write_part(&mut out, &frame(payload)).unwrap();
            let (declared, parsed) = parse_part(&out);
            assert_eq!(declared, payload.len());
            assert_eq!(parsed, payload);
        }
    }

    #[test]
    fn test_binary_payload_round_trip() {
        // payload containing the boundary bytes must still frame correctly
        let payload = b"--frame\r\n\xFF\xD8\x00\x01\x02--frame";
        let mut out = Vec::new();
        write_part(&mut out, &frame(payload)).unwrap();
        let (declared, parsed) = parse_part(&out);
        assert_eq!(declared, payload.len());
        assert_eq!(parsed, payload.to_vec());
    }

    #[test]
    fn test_stream_header_announces_boundary() {
        let mut out = Vec::new();
        write_stream_header(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("multipart/x-mixed-replace;boundary=frame"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_encoder_is_stateless_across_parts() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        write_part(&mut a, &frame(b"same")).unwrap();
        write_part(&mut b, &frame(b"same")).unwrap();
        assert_eq!(a, b);
    }
}
