//! Command runners
//!
//! Every runner reads its JSON inputs, dispatches one operation and hands
//! the outcome to [`emit`].

pub mod entity;
pub mod organization;

use crate::Context;
use crate::resource::Outcome;
use crate::ui;
use anyhow::{Context as _, Result, bail};
use declarative::ResourceState;
use serde_json::Value;
use std::io::{self, Read, Write};
use std::path::Path;

/// Read a JSON document from `path`, or stdin when `path` is `-`
pub fn read_document(path: &Path) -> Result<Value> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Could not read document from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Could not read document: {}", path.display()))?
    };
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON document: {}", path.display()))
}

/// Print diagnostics and the resulting state
///
/// State goes to `out` as JSON (`null` for Absent); diagnostics go to
/// stderr. Any error diagnostic fails the command.
pub fn emit(ctx: &Context, out: &mut impl Write, outcome: Outcome) -> Result<()> {
    ui::diagnostics(&outcome.diagnostics, ctx.quiet);

    if outcome.failed() {
        let count = outcome.diagnostics.iter().filter(|d| d.is_error()).count();
        bail!("operation failed with {count} error(s)");
    }

    let document = match outcome.state {
        Some(ResourceState::Present(state)) => state,
        Some(ResourceState::Absent) => Value::Null,
        None => return Ok(()),
    };
    let text = serde_json::to_string_pretty(&document).context("Failed to serialize state")?;
    writeln!(out, "{text}").context("Could not write state")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{Diagnostic, Diagnostics};
    use serde_json::json;
    use tempfile::TempDir;

    fn ctx() -> Context {
        Context {
            verbose: 0,
            quiet: true,
        }
    }

    fn emitted(outcome: Outcome) -> (Result<()>, String) {
        let mut out = Vec::new();
        let result = emit(&ctx(), &mut out, outcome);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_read_document_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("zone.json");
        std::fs::write(&path, r#"{"name": "prod"}"#).unwrap();
        assert_eq!(read_document(&path).unwrap(), json!({ "name": "prod" }));
    }

    #[test]
    fn test_read_document_rejects_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("zone.json");
        std::fs::write(&path, "name: prod").unwrap();
        let err = read_document(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON document"));
    }

    #[test]
    fn test_emit_present_state() {
        let (result, out) = emitted(Outcome {
            state: Some(ResourceState::Present(json!({ "id": "tz-1" }))),
            diagnostics: Diagnostics::new(),
        });
        result.unwrap();
        assert_eq!(serde_json::from_str::<Value>(&out).unwrap(), json!({ "id": "tz-1" }));
    }

    #[test]
    fn test_emit_absent_is_null() {
        let (result, out) = emitted(Outcome {
            state: Some(ResourceState::Absent),
            diagnostics: Diagnostics::new(),
        });
        result.unwrap();
        assert_eq!(out.trim(), "null");
    }

    #[test]
    fn test_emit_error_prints_nothing() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::error("Error creating trust zone", "boom"));
        let (result, out) = emitted(Outcome {
            state: None,
            diagnostics,
        });
        assert!(result.is_err());
        assert!(out.is_empty());
    }
}
