//! Compile request wire shape and validation.
//!
//! A submission is a JSON object of the form:
//!
//! ```json
//! {"sources": {"token.vy": {"content": "..."}, "lib.vy": {"content": "..."}}}
//! ```
//!
//! Only the first entry (by insertion order; `serde_json` is built with
//! `preserve_order`) is compiled. The remaining entries are carried
//! through into the artifact's `sources` field untouched. Validation
//! happens here, before any job is created, so a malformed submission
//! never consumes a job id.

use crate::{Error, Result};
use serde_json::{Map, Value};

/// A validated compilation request.
///
/// Constructed via [`CompileRequest::from_value`], which enforces every
/// structural precondition. Once built, the primary source id and text
/// are guaranteed to be present and non-empty.
#[derive(Clone, Debug)]
pub struct CompileRequest {
    sources: Map<String, Value>,
    source_id: String,
    source_text: String,
}

impl CompileRequest {
    /// Validates a raw JSON body into a [`CompileRequest`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] when:
    /// - the body is not a JSON object or lacks a `sources` key,
    /// - `sources` is not an object or is empty,
    /// - the first source entry has no `content` field,
    /// - `content` is not a string, or is empty.
    pub fn from_value(body: &Value) -> Result<Self> {
        let sources = body
            .get("sources")
            .ok_or_else(|| Error::InvalidRequest {
                reason: "Missing sources key".to_string(),
            })?
            .as_object()
            .ok_or_else(|| Error::InvalidRequest {
                reason: "Sources must be an object".to_string(),
            })?;

        if sources.is_empty() {
            return Err(Error::InvalidRequest {
                reason: "No sources provided".to_string(),
            });
        }

        // First entry by insertion order is the unit that gets compiled.
        let (source_id, descriptor) = sources
            .iter()
            .next()
            .expect("non-empty map has a first entry");

        let content = descriptor.get("content").ok_or_else(|| Error::InvalidRequest {
            reason: "No code provided in sources".to_string(),
        })?;

        let source_text = content.as_str().ok_or_else(|| Error::InvalidRequest {
            reason: "Code must be a non-empty string".to_string(),
        })?;

        if source_text.is_empty() {
            return Err(Error::InvalidRequest {
                reason: "No code provided in sources".to_string(),
            });
        }

        Ok(Self {
            sources: sources.clone(),
            source_id: source_id.clone(),
            source_text: source_text.to_string(),
        })
    }

    /// Path-like identifier of the source that will be compiled.
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Source text of the entry that will be compiled.
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// The full `sources` map as submitted, in insertion order.
    pub fn sources(&self) -> &Map<String, Value> {
        &self.sources
    }

    /// Consumes the request, yielding `(source_id, source_text, sources)`.
    pub fn into_parts(self) -> (String, String, Map<String, Value>) {
        (self.source_id, self.source_text, self.sources)
    }
}
