//! Job identifier generation.
//!
//! Every submission receives an id that doubles as a bearer token for
//! result retrieval, so it must be unguessable as well as collision-free
//! for the life of the process. Each id is a full random 128-bit value
//! from the thread-local RNG (ChaCha-based, periodically reseeded),
//! rendered as 32 lowercase hex characters behind a constant `tmp` tag
//! that namespaces job ids apart from other identifiers the front door
//! might serve.
//!
//! No truncation: at 128 bits the birthday bound keeps the collision
//! probability negligible for any realistic job volume, so the store
//! treats a duplicate as an invariant violation rather than a retryable
//! condition.

use rand::{Rng, rng};

/// Constant tag prefixed to every job id.
pub const JOB_ID_PREFIX: &str = "tmp";

/// Mints a fresh job identifier: `tmp` + 32 hex chars of a random `u128`.
pub fn mint_job_id() -> String {
    let value: u128 = rng().random();
    format!("{JOB_ID_PREFIX}{value:032x}")
}
