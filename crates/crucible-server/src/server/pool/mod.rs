pub mod manager;
pub mod worker;

use serde_json::{Map, Value};

/// One unit of work handed to the pool: everything a worker needs to
/// compile the designated source and publish the outcome.
#[derive(Debug)]
pub struct CompileTask {
    pub job_id: String,
    pub source_id: String,
    pub source_text: String,
    /// Full submitted sources map, echoed into the artifact.
    pub sources: Map<String, Value>,
}
