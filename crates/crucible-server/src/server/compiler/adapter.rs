//! Normalizes compiler results into job outcomes.
//!
//! The adapter owns the information-hiding contract at the compiler
//! boundary: structured diagnostics pass through to callers, everything
//! else (internal faults, panics) is logged in full and replaced by a
//! generic message. Raw internal error text is free to change across
//! compiler versions without becoming part of the public API.

use super::{CompileFault, Compiler};
use crucible_core::{
    Artifact, Bytecode, CompileError, ContractType, JobOutcome, contract_name_from_source_id,
};
use serde_json::{Map, Value};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Sanitized message callers see when the compiler invocation failed in
/// an unexpected way.
const FAULT_MESSAGE: &str = "internal compiler error";

pub struct CompilerAdapter {
    compiler: Arc<dyn Compiler>,
}

impl CompilerAdapter {
    pub fn new(compiler: Arc<dyn Compiler>) -> Self {
        Self { compiler }
    }

    /// Compiles the designated source entry and assembles the outcome.
    ///
    /// Blocking; run from a worker slot. `sources` is the full submitted
    /// map, echoed into the artifact on success. Always yields an
    /// outcome: every failure mode maps to a `Failed` job rather than
    /// escaping into the worker.
    pub fn run(
        &self,
        source_id: &str,
        source_text: &str,
        sources: Map<String, Value>,
    ) -> JobOutcome {
        let result = catch_unwind(AssertUnwindSafe(|| {
            self.compiler.compile(source_id, source_text)
        }));

        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(CompileFault::Diagnostic(diagnostic))) => {
                tracing::debug!(source_id, message = %diagnostic.message, "compilation failed");
                return JobOutcome::Error(diagnostic);
            }
            Ok(Err(CompileFault::Internal(detail))) => {
                tracing::error!(source_id, %detail, "compiler fault");
                return JobOutcome::Error(CompileError::new(FAULT_MESSAGE));
            }
            Err(panic) => {
                let detail = panic_message(&panic);
                tracing::error!(source_id, %detail, "compiler panicked");
                return JobOutcome::Error(CompileError::new(FAULT_MESSAGE));
            }
        };

        let contract_name = contract_name_from_source_id(source_id);
        let contract_type = ContractType {
            contract_name: contract_name.clone(),
            source_id: source_id.to_string(),
            deployment_bytecode: Bytecode {
                bytecode: output.bytecode,
            },
            runtime_bytecode: Bytecode {
                bytecode: output.runtime_bytecode,
            },
            abi: output.abi,
            sourcemap: output.source_map,
        };

        JobOutcome::Artifact(Box::new(Artifact::single(
            sources,
            contract_type,
            output.method_identifiers,
        )))
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "opaque panic payload".to_string()
    }
}
