//! # Artifact and Diagnostic Types
//!
//! The compiled output is shaped after the ethpm v3 package manifest
//! convention so existing tooling can consume it directly. Field casing
//! is part of the wire contract (`contractTypes`, `methodIdentifiers`,
//! but `dev_messages`) and must not be normalized.
//!
//! An [`Artifact`] is produced exactly once by the compiler adapter and
//! is immutable thereafter; it is owned by the job it is attached to.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Manifest tag stamped on every artifact.
pub const MANIFEST: &str = "ethpm/3";

/// Structured compiler diagnostic: a normal, expected job outcome for
/// source text that fails to compile. Position fields are optional
/// because not every diagnostic carries one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompileError {
    pub message: String,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub column: Option<u32>,
}

impl CompileError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn with_position(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

/// A bytecode blob, wrapped to match the manifest layout.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bytecode {
    pub bytecode: String,
}

/// Per-contract compiled output within an [`Artifact`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractType {
    pub contract_name: String,
    pub source_id: String,
    pub deployment_bytecode: Bytecode,
    pub runtime_bytecode: Bytecode,
    pub abi: Value,
    pub sourcemap: String,
}

/// The compiled output for one submission, ethpm/3 shaped.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Artifact {
    pub manifest: String,
    pub name: Option<String>,
    pub version: Option<String>,
    pub meta: Option<Value>,
    pub sources: Map<String, Value>,
    #[serde(rename = "contractTypes")]
    pub contract_types: Map<String, Value>,
    pub pcmap: Map<String, Value>,
    pub dev_messages: Map<String, Value>,
    pub ast: Map<String, Value>,
    pub userdoc: Map<String, Value>,
    pub devdoc: Map<String, Value>,
    #[serde(rename = "methodIdentifiers")]
    pub method_identifiers: Map<String, Value>,
}

impl Artifact {
    /// Assembles a manifest around a single compiled contract.
    ///
    /// `sources` is the full submitted map, echoed verbatim; only the
    /// contract described by `contract_type` was actually compiled.
    pub fn single(
        sources: Map<String, Value>,
        contract_type: ContractType,
        method_identifiers: Map<String, Value>,
    ) -> Self {
        let mut contract_types = Map::new();
        let name = contract_type.contract_name.clone();
        let value = serde_json::to_value(contract_type)
            .expect("contract type serializes to a JSON object");
        contract_types.insert(name, value);

        Self {
            manifest: MANIFEST.to_string(),
            name: None,
            version: None,
            meta: None,
            sources,
            contract_types,
            pcmap: Map::new(),
            dev_messages: Map::new(),
            ast: Map::new(),
            userdoc: Map::new(),
            devdoc: Map::new(),
            method_identifiers,
        }
    }
}

/// Derives a contract name from a path-like source id.
///
/// `examples/tokens/ERC20.vy` becomes `ERC20`. Ids without an extension
/// fall back to `Contract`.
pub fn contract_name_from_source_id(source_id: &str) -> String {
    if !source_id.contains('.') {
        return "Contract".to_string();
    }
    let file = source_id.rsplit('/').next().unwrap_or(source_id);
    file.split('.').next().unwrap_or(file).to_string()
}
