//! Server configuration: CLI flags, environment overrides, validation.
//!
//! Flags are parsed with `clap` and may also be supplied through the
//! environment (or a `.env` file loaded in `main`). [`ServerConfig`] is
//! the validated form handed to the rest of the server.

use clap::Parser;
use core::time::Duration;
use std::path::PathBuf;

/// Command-line arguments for the compilation job service.
#[derive(Parser, Debug)]
#[command(name = "crucible-server", version, about)]
pub struct CliArgs {
    /// Address to listen on.
    #[arg(long, env = "CRUCIBLE_ADDR", default_value = "0.0.0.0:8000")]
    pub addr: String,

    /// Number of worker slots. Bounds the maximum number of concurrent
    /// compilations.
    #[arg(long, env = "CRUCIBLE_WORKERS", default_value_t = 4)]
    pub workers: usize,

    /// Capacity of the FIFO work queue feeding the pool.
    #[arg(long, env = "CRUCIBLE_QUEUE_DEPTH", default_value_t = 1024)]
    pub queue_depth: usize,

    /// Compiler executable invoked for each job.
    #[arg(long, env = "CRUCIBLE_COMPILER", default_value = "vyper")]
    pub compiler: PathBuf,

    /// How long shutdown waits for in-flight jobs to drain, in seconds.
    #[arg(long, env = "CRUCIBLE_DRAIN_TIMEOUT_SECS", default_value_t = 30)]
    pub drain_timeout_secs: u64,
}

/// Validated server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub server_addr: String,
    pub num_workers: usize,
    pub queue_depth: usize,
    pub compiler_cmd: PathBuf,
    pub drain_timeout: Duration,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.workers == 0 {
            anyhow::bail!("--workers must be greater than 0");
        }
        if args.queue_depth == 0 {
            anyhow::bail!("--queue-depth must be greater than 0");
        }

        Ok(Self {
            server_addr: args.addr,
            num_workers: args.workers,
            queue_depth: args.queue_depth,
            compiler_cmd: args.compiler,
            drain_timeout: Duration::from_secs(args.drain_timeout_secs),
        })
    }
}
