pub mod compiler;
pub mod config;
pub mod http;
pub mod id;
pub mod pool;
pub mod service;
pub mod store;
pub mod telemetry;
