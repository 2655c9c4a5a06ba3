mod artifact;
mod error;
mod job;
mod request;

pub use artifact::*;
pub use error::*;
pub use job::*;
pub use request::*;
