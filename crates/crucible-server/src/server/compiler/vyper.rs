//! Production [`Compiler`] implementation shelling out to `vyper`.
//!
//! Each invocation writes the source text to a scratch file, runs
//! `vyper -f combined_json <file>`, and maps the process result back:
//! a zero exit status yields a [`CompileOutput`] parsed from stdout, a
//! non-zero status yields a diagnostic parsed from stderr with a
//! best-effort `line N:M` position extraction. Failures to even run the
//! process (missing binary, unparsable output) are internal faults, not
//! diagnostics.

use super::{CompileFault, CompileOutput, Compiler};
use crucible_core::CompileError;
use rand::{Rng, rng};
use serde_json::Value;
use std::path::PathBuf;
use std::process::Command;

pub struct VyperCompiler {
    command: PathBuf,
}

impl VyperCompiler {
    pub fn new(command: PathBuf) -> Self {
        Self { command }
    }

    /// Scratch path for one invocation. The random suffix keeps
    /// concurrent workers from clobbering each other's inputs.
    fn scratch_path(&self) -> PathBuf {
        let nonce: u64 = rng().random();
        std::env::temp_dir().join(format!("crucible-{nonce:016x}.vy"))
    }
}

impl Compiler for VyperCompiler {
    fn compile(&self, source_id: &str, source_text: &str) -> Result<CompileOutput, CompileFault> {
        let path = self.scratch_path();
        std::fs::write(&path, source_text).map_err(|e| {
            CompileFault::Internal(format!("failed to stage source {source_id}: {e}"))
        })?;

        let result = Command::new(&self.command)
            .arg("-f")
            .arg("combined_json")
            .arg(&path)
            .output();

        // Best effort; a leaked scratch file is harmless.
        let _ = std::fs::remove_file(&path);

        let output = result.map_err(|e| {
            CompileFault::Internal(format!(
                "failed to invoke {}: {e}",
                self.command.display()
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr.trim();
            let message = if message.is_empty() {
                format!("compiler exited with {}", output.status)
            } else {
                message.to_string()
            };
            return Err(CompileFault::Diagnostic(to_diagnostic(&message)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_combined_json(&stdout).ok_or_else(|| {
            CompileFault::Internal(format!(
                "{} produced unparsable combined_json output",
                self.command.display()
            ))
        })
    }
}

/// Builds a diagnostic from compiler stderr, lifting a `line N:M`
/// position into structured fields when one is present.
fn to_diagnostic(message: &str) -> CompileError {
    match parse_position(message) {
        Some((line, column)) => CompileError::new(message).with_position(line, column),
        None => CompileError::new(message),
    }
}

/// Finds the first `line <N>:<M>` occurrence in a diagnostic message.
fn parse_position(message: &str) -> Option<(u32, u32)> {
    let idx = message.find("line ")?;
    let rest = &message[idx + "line ".len()..];
    let (line_part, rest) = rest.split_once(':')?;
    let line: u32 = line_part.trim().parse().ok()?;
    let column: u32 = rest
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .ok()?;
    Some((line, column))
}

/// Extracts the per-contract section from `vyper -f combined_json`
/// output. The document maps the input path to the output fields, plus
/// a top-level `version` key; the first object value carrying a
/// `bytecode` field is the contract we compiled.
fn parse_combined_json(stdout: &str) -> Option<CompileOutput> {
    let doc: Value = serde_json::from_str(stdout).ok()?;
    let entries = doc.as_object()?;
    let contract = entries
        .values()
        .find(|v| v.is_object() && v.get("bytecode").is_some())?;

    let field_str = |key: &str| {
        contract
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    // source_map is an object in combined_json output; the manifest
    // carries it as a string.
    let source_map = match contract.get("source_map") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };

    Some(CompileOutput {
        bytecode: field_str("bytecode"),
        runtime_bytecode: field_str("bytecode_runtime"),
        abi: contract.get("abi").cloned().unwrap_or(Value::Array(vec![])),
        source_map,
        method_identifiers: contract
            .get("method_identifiers")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
    })
}
