//! The boundary shim around the external compiler.
//!
//! The compiler itself is a black box behind the [`Compiler`] trait:
//! synchronous, blocking, CPU-heavy. The service only ever invokes it
//! from a worker slot, never on the request path. [`adapter`] normalizes
//! whatever the trait implementation returns into the job outcome types;
//! [`vyper`] is the production implementation shelling out to a `vyper`
//! binary.

pub mod adapter;
pub mod vyper;

use crucible_core::CompileError;
use serde_json::{Map, Value};

/// Normalized output of a successful compilation.
#[derive(Clone, Debug, Default)]
pub struct CompileOutput {
    pub bytecode: String,
    pub runtime_bytecode: String,
    pub abi: Value,
    pub source_map: String,
    pub method_identifiers: Map<String, Value>,
}

/// Why a compilation did not produce output.
#[derive(Clone, Debug)]
pub enum CompileFault {
    /// A structured diagnostic from the compiler: an expected outcome
    /// for bad source text, forwarded to the caller as-is.
    Diagnostic(CompileError),
    /// Anything else: a crashed process, unparsable output, a missing
    /// binary. Logged in full internally, surfaced generically.
    Internal(String),
}

/// A synchronous source-to-bytecode compiler.
///
/// `compile` blocks for the duration of the compilation; callers are
/// responsible for keeping it off the responsiveness-critical path.
pub trait Compiler: Send + Sync {
    fn compile(&self, source_id: &str, source_text: &str) -> Result<CompileOutput, CompileFault>;
}
