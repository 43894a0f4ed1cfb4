//! Compile a small layered configuration and render it with documentation.
//!
//! Run with `cargo run --example annotated`.

use std::io::Write;

use serde::Deserialize;
use serde_json::json;
use strata_config::{Config, MarshalOption, ROOT, SourceOption};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Database {
    host: String,
    port: u16,
}

const DOCS: &str = r#"{
    "Type": "<root>",
    "Children": {
        "Database": {
            "Type": "<struct>",
            "Doc": "Database connection configuration",
            "Children": {
                "Host": {"Type": "<string>", "Doc": "database server hostname"},
                "Port": {"Type": "<int>", "Doc": "database server port"}
            }
        }
    }
}"#;

fn main() -> anyhow::Result<()> {
    let cfg = Config::builder()
        .with_default_codecs()
        .add_value(
            "defaults",
            ROOT,
            &json!({"Database": {"Host": "localhost", "Port": 5432}}),
            &[SourceOption::AsDefault],
        )
        .add_buffer("10-site.json", r#"{"Database": {"Port": 6432}}"#, &[])
        .expand_env(&[])
        .add_docs_json(DOCS.as_bytes())
        .build()?;
    cfg.compile()?;

    let database: Database = cfg.unmarshal("Database", &[])?;
    writeln!(std::io::stdout(), "connecting to {}:{}", database.host, database.port)?;

    let annotated = cfg.marshal(&[MarshalOption::IncludeDocumentation(true)])?;
    std::io::stdout().write_all(&annotated)?;
    Ok(())
}
