//! Tests covering error display formatting and constructor helpers.

use super::StrataError;

#[test]
fn decoding_error_names_the_record_and_extension() {
    let err = StrataError::decoding("app.json", "json", std::io::Error::other("bad byte"));
    let text = err.to_string();
    assert!(text.contains("app.json"), "missing record name: {text}");
    assert!(text.contains("'json'"), "missing extension: {text}");
}

#[test]
fn type_mismatch_carries_the_key_path() {
    let err = StrataError::type_mismatch("servers.0.port", "cannot merge map with array");
    assert!(matches!(&*err, StrataError::TypeMismatch { key, .. } if key == "servers.0.port"));
}

#[test]
fn file_error_preserves_the_io_source() {
    let err = StrataError::file("conf.d", std::io::Error::other("device gone"));
    let source = std::error::Error::source(&*err);
    assert!(source.is_some_and(|s| s.to_string().contains("device gone")));
}
