//! Tests covering builder validation, the compile pipeline and the mutex
//! guarantees of the aggregate.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserialize;
use serde_json::json;

use super::{Config, SourceOption, UnmarshalOption};
use crate::error::StrataError;
use crate::source::MemFs;

fn builder() -> super::ConfigBuilder {
    Config::builder().with_default_codecs()
}

#[derive(Debug, Default, Deserialize, PartialEq)]
struct Status {
    #[serde(default)]
    status: String,
    #[serde(default)]
    other: String,
}

#[test]
fn reads_before_the_first_compile_are_rejected() {
    let cfg = builder()
        .build()
        .unwrap_or_else(|e| panic!("build failed: {e}"));

    let err = cfg
        .unmarshal::<Status>("", &[])
        .err()
        .unwrap_or_else(|| panic!("expected not-compiled"));
    assert!(matches!(&*err, StrataError::NotCompiled));
    assert!(matches!(
        cfg.marshal(&[]).err().as_deref(),
        Some(StrataError::NotCompiled)
    ));
    assert!(matches!(
        cfg.records().err().as_deref(),
        Some(StrataError::NotCompiled)
    ));
}

#[test]
fn empty_record_names_fail_at_build() {
    let err = builder()
        .add_buffer("", "{}", &[])
        .build()
        .err()
        .unwrap_or_else(|| panic!("expected invalid input"));
    assert!(matches!(&*err, StrataError::InvalidInput { .. }));
}

#[test]
fn empty_delimiters_fail_at_build() {
    let err = builder()
        .key_delimiter("")
        .build()
        .err()
        .unwrap_or_else(|| panic!("expected invalid input"));
    assert!(matches!(&*err, StrataError::InvalidInput { .. }));
}

#[test]
fn duplicate_codec_registration_fails_at_build() {
    let err = Config::builder()
        .with_default_codecs()
        .with_decoder(Arc::new(crate::codec::JsonCodec::new()))
        .build()
        .err()
        .unwrap_or_else(|| panic!("expected duplicate"));
    assert!(matches!(&*err, StrataError::DuplicateFound { .. }));
}

#[test]
fn defaults_lose_to_value_records_across_sources() {
    let fs = MemFs::new()
        .with("z.json", r#"{"status": "zeta"}"#)
        .with("a.json", r#"{"other": "alpha"}"#);

    let cfg = builder()
        .add_buffer("defaults.json", r#"{"status": "default"}"#, &[SourceOption::AsDefault])
        .add_file_group(crate::source::FileGroup::new(Arc::new(fs)))
        .build()
        .unwrap_or_else(|e| panic!("build failed: {e}"));
    cfg.compile().unwrap_or_else(|e| panic!("compile failed: {e}"));

    let got: Status = cfg
        .unmarshal("", &[])
        .unwrap_or_else(|e| panic!("unmarshal failed: {e}"));
    assert_eq!(
        got,
        Status {
            status: "zeta".to_owned(),
            other: "alpha".to_owned(),
        }
    );
    assert_eq!(
        cfg.records()
            .unwrap_or_else(|e| panic!("records failed: {e}")),
        ["a.json", "z.json"]
    );
}

#[test]
fn values_nest_under_their_key_path() {
    let cfg = builder()
        .add_value("svc.json", "server.port", &8080, &[])
        .build()
        .unwrap_or_else(|e| panic!("build failed: {e}"));
    cfg.compile().unwrap_or_else(|e| panic!("compile failed: {e}"));

    let port: u16 = cfg
        .unmarshal("server.port", &[])
        .unwrap_or_else(|e| panic!("unmarshal failed: {e}"));
    assert_eq!(port, 8080);
}

#[test]
fn deferred_buffers_see_the_configuration_merged_so_far() {
    let cfg = builder()
        .add_buffer("00-base.json", r#"{"base": "files"}"#, &[])
        .add_buffer_with(
            "99-derived.json",
            |_, partial| {
                let base: String = partial.unmarshal("base", &[])?;
                Ok(serde_json::to_vec(&json!({"derived": format!("{base}-extra")}))?)
            },
            &[],
        )
        .build()
        .unwrap_or_else(|e| panic!("build failed: {e}"));
    cfg.compile().unwrap_or_else(|e| panic!("compile failed: {e}"));

    let derived: String = cfg
        .unmarshal("derived", &[])
        .unwrap_or_else(|e| panic!("unmarshal failed: {e}"));
    assert_eq!(derived, "files-extra");
}

#[test]
fn optional_misses_return_the_default_value() {
    let cfg = builder()
        .add_buffer("cfg.json", r#"{"present": 1}"#, &[])
        .build()
        .unwrap_or_else(|e| panic!("build failed: {e}"));
    cfg.compile().unwrap_or_else(|e| panic!("compile failed: {e}"));

    let got: Status = cfg
        .unmarshal("absent", &[UnmarshalOption::Optional])
        .unwrap_or_else(|e| panic!("unmarshal failed: {e}"));
    assert_eq!(got, Status::default());

    let err = cfg
        .unmarshal::<Status>("absent", &[])
        .err()
        .unwrap_or_else(|| panic!("expected miss"));
    assert!(matches!(&*err, StrataError::NotFound { .. }));
}

#[test]
fn failed_recompiles_leave_the_previous_tree_in_place() {
    let broken = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&broken);

    let cfg = builder()
        .add_buffer_with(
            "cfg.json",
            move |_, _| {
                if flag.load(Ordering::SeqCst) {
                    Ok(b"{broken".to_vec())
                } else {
                    Ok(br#"{"status": "good"}"#.to_vec())
                }
            },
            &[],
        )
        .build()
        .unwrap_or_else(|e| panic!("build failed: {e}"));

    cfg.compile().unwrap_or_else(|e| panic!("compile failed: {e}"));
    broken.store(true, Ordering::SeqCst);

    let err = cfg
        .compile()
        .err()
        .unwrap_or_else(|| panic!("expected decode failure"));
    assert!(matches!(&*err, StrataError::Decoding { .. }));

    let got: Status = cfg
        .unmarshal("", &[])
        .unwrap_or_else(|e| panic!("unmarshal failed: {e}"));
    assert_eq!(got.status, "good", "previous tree must survive the failure");
}

#[test]
fn type_conflicts_between_records_abort_the_compile() {
    let cfg = builder()
        .add_buffer("a.json", r#"{"a": {"x": 1}}"#, &[])
        .add_buffer("b.json", r#"{"a": [1]}"#, &[])
        .build()
        .unwrap_or_else(|e| panic!("build failed: {e}"));

    let err = cfg
        .compile()
        .err()
        .unwrap_or_else(|| panic!("expected conflict"));
    assert!(matches!(&*err, StrataError::TypeMismatch { key, .. } if key == "a"));
}

#[test]
fn the_aggregate_serializes_concurrent_use() {
    let cfg = Arc::new(
        builder()
            .add_buffer("cfg.json", r#"{"status": "ok"}"#, &[])
            .build()
            .unwrap_or_else(|e| panic!("build failed: {e}")),
    );
    cfg.compile().unwrap_or_else(|e| panic!("compile failed: {e}"));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cfg = Arc::clone(&cfg);
            std::thread::spawn(move || {
                for _ in 0..25 {
                    cfg.compile().unwrap_or_else(|e| panic!("compile failed: {e}"));
                    let got: Status = cfg
                        .unmarshal("", &[])
                        .unwrap_or_else(|e| panic!("unmarshal failed: {e}"));
                    assert_eq!(got.status, "ok");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap_or_else(|_| panic!("worker panicked"));
    }
}
