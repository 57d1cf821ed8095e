// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use javelin_core::sexp::Sexp;

#[tokio::test]
async fn frames_round_trip() {
    let message = Sexp::parse("(:return (:ok t) 42)").unwrap();
    let mut buf = Vec::new();
    write_frame(&mut buf, &message).await.unwrap();

    let mut cursor = std::io::Cursor::new(buf);
    let read = read_frame(&mut cursor).await.unwrap();
    assert_eq!(read, message);
}

#[tokio::test]
async fn header_is_six_hex_digits() {
    let message = Sexp::parse("(:ping)").unwrap();
    let mut buf = Vec::new();
    write_frame(&mut buf, &message).await.unwrap();

    let header = std::str::from_utf8(&buf[..6]).unwrap();
    assert_eq!(usize::from_str_radix(header, 16).unwrap(), buf.len() - 6);
    assert_eq!(header, format!("{:06x}", buf.len() - 6));
}

#[tokio::test]
async fn consecutive_frames_are_read_in_order() {
    let first = Sexp::parse("(one 1)").unwrap();
    let second = Sexp::parse("(two 2)").unwrap();
    let mut buf = Vec::new();
    write_frame(&mut buf, &first).await.unwrap();
    write_frame(&mut buf, &second).await.unwrap();

    let mut cursor = std::io::Cursor::new(buf);
    assert_eq!(read_frame(&mut cursor).await.unwrap(), first);
    assert_eq!(read_frame(&mut cursor).await.unwrap(), second);
}

#[tokio::test]
async fn eof_reports_connection_closed() {
    let mut cursor = std::io::Cursor::new(Vec::new());
    assert!(matches!(
        read_frame(&mut cursor).await,
        Err(CodecError::ConnectionClosed)
    ));
}

#[tokio::test]
async fn garbage_header_is_rejected() {
    let mut cursor = std::io::Cursor::new(b"zzzzzz(:ping)".to_vec());
    assert!(matches!(
        read_frame(&mut cursor).await,
        Err(CodecError::BadHeader(_))
    ));
}

#[tokio::test]
async fn malformed_payload_is_a_sexp_error() {
    let payload = b"(unclosed";
    let mut buf = format!("{:06x}", payload.len()).into_bytes();
    buf.extend_from_slice(payload);
    let mut cursor = std::io::Cursor::new(buf);
    assert!(matches!(
        read_frame(&mut cursor).await,
        Err(CodecError::Sexp(_))
    ));
}

#[tokio::test]
async fn escaped_strings_survive_the_wire() {
    let message = Sexp::list(vec![
        Sexp::keyword("detail"),
        Sexp::string("a \"quoted\" path\\here"),
    ]);
    let mut buf = Vec::new();
    write_frame(&mut buf, &message).await.unwrap();
    let mut cursor = std::io::Cursor::new(buf);
    assert_eq!(read_frame(&mut cursor).await.unwrap(), message);
}
