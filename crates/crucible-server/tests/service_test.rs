//! End-to-end service tests against a scripted compiler.
//!
//! These exercise the dispatch path the way the front door does
//! (submit, poll, fetch) without going through HTTP.

use core::time::Duration;
use crucible_core::{CompileError, Error, JobOutcome, JobStatus};
use crucible_server::server::compiler::{CompileFault, CompileOutput, Compiler};
use crucible_server::server::config::ServerConfig;
use crucible_server::server::service::handler::CompileService;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A compiler stand-in: sleeps for a configurable time, fails sources
/// containing `syntax error`, and records how many invocations run
/// concurrently.
struct StubCompiler {
    delay: Duration,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl StubCompiler {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    fn max_active(&self) -> usize {
        self.max_active.load(Ordering::Acquire)
    }
}

impl Compiler for StubCompiler {
    fn compile(&self, _source_id: &str, source_text: &str) -> Result<CompileOutput, CompileFault> {
        let now = self.active.fetch_add(1, Ordering::AcqRel) + 1;
        self.max_active.fetch_max(now, Ordering::AcqRel);
        std::thread::sleep(self.delay);
        self.active.fetch_sub(1, Ordering::AcqRel);

        if source_text.contains("syntax error") {
            return Err(CompileFault::Diagnostic(
                CompileError::new("SyntaxException: invalid syntax").with_position(1, 0),
            ));
        }

        Ok(CompileOutput {
            bytecode: "0x6001".to_string(),
            runtime_bytecode: "0x6002".to_string(),
            abi: json!([]),
            source_map: String::new(),
            method_identifiers: serde_json::Map::new(),
        })
    }
}

fn config(workers: usize) -> ServerConfig {
    ServerConfig {
        server_addr: "127.0.0.1:0".to_string(),
        num_workers: workers,
        queue_depth: 256,
        compiler_cmd: PathBuf::from("unused"),
        drain_timeout: Duration::from_secs(5),
    }
}

fn service_with(workers: usize, compiler: Arc<StubCompiler>) -> CompileService {
    CompileService::new(&config(workers), compiler)
}

fn request(path: &str, content: &str) -> Value {
    json!({"sources": {path: {"content": content}}})
}

async fn wait_for_terminal(service: &CompileService, job_id: &str) -> JobStatus {
    for _ in 0..500 {
        let status = service.status(job_id).unwrap();
        if status.is_terminal() {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} did not resolve in time");
}

#[tokio::test(flavor = "multi_thread")]
async fn valid_source_resolves_to_artifact() {
    let service = service_with(2, Arc::new(StubCompiler::new(Duration::ZERO)));

    let job_id = service.submit(&request("a.src", "valid program")).await.unwrap();
    assert!(job_id.starts_with("tmp"));

    let status = wait_for_terminal(&service, &job_id).await;
    assert_eq!(status, JobStatus::Succeeded);

    let outcome = service.artifact(&job_id).unwrap().unwrap();
    let JobOutcome::Artifact(artifact) = outcome else {
        panic!("expected artifact");
    };
    assert_eq!(artifact.manifest, "ethpm/3");
    assert_eq!(
        artifact.contract_types.get("a").unwrap()["contractName"],
        "a"
    );
    assert_eq!(artifact.sources.get("a.src").unwrap()["content"], "valid program");
}

#[tokio::test(flavor = "multi_thread")]
async fn bad_source_resolves_to_diagnostic() {
    let service = service_with(2, Arc::new(StubCompiler::new(Duration::ZERO)));

    let job_id = service
        .submit(&request("bad.src", "this is a syntax error"))
        .await
        .unwrap();

    let status = wait_for_terminal(&service, &job_id).await;
    assert_eq!(status, JobStatus::Failed);

    let outcome = service.artifact(&job_id).unwrap().unwrap();
    let JobOutcome::Error(diag) = outcome else {
        panic!("expected diagnostic");
    };
    assert!(!diag.message.is_empty());
    assert_eq!(diag.line, Some(1));
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_sources_is_rejected_without_consuming_an_id() {
    let service = service_with(1, Arc::new(StubCompiler::new(Duration::ZERO)));

    let err = service.submit(&json!({"sources": {}})).await.unwrap_err();
    assert!(matches!(err, Error::InvalidRequest { .. }));
    assert_eq!(service.job_count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_id_is_not_found() {
    let service = service_with(1, Arc::new(StubCompiler::new(Duration::ZERO)));

    assert!(matches!(
        service.status("tmpdoesnotexist"),
        Err(Error::NotFound { .. })
    ));
    assert!(matches!(
        service.artifact("tmpdoesnotexist"),
        Err(Error::NotFound { .. })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_submissions_get_independent_jobs() {
    let service = service_with(2, Arc::new(StubCompiler::new(Duration::ZERO)));
    let body = request("twin.src", "valid program");

    let first = service.submit(&body).await.unwrap();
    let second = service.submit(&body).await.unwrap();
    assert_ne!(first, second);

    wait_for_terminal(&service, &first).await;
    wait_for_terminal(&service, &second).await;

    let a = serde_json::to_value(service.artifact(&first).unwrap().unwrap()).unwrap();
    let b = serde_json::to_value(service.artifact(&second).unwrap().unwrap()).unwrap();
    // Equivalent outputs, separately owned.
    assert_eq!(a, b);
}

#[tokio::test(flavor = "multi_thread")]
async fn submitted_id_is_immediately_visible() {
    // The id must map to at least `Pending` the moment submit returns,
    // no matter how submission interleaves with worker completion.
    let service = service_with(2, Arc::new(StubCompiler::new(Duration::from_millis(5))));

    for i in 0..100 {
        let job_id = service
            .submit(&request(&format!("v{i}.src"), "valid program"))
            .await
            .unwrap();
        assert!(
            service.status(&job_id).is_ok(),
            "id {job_id} not visible right after submit"
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pool_bounds_concurrent_compilations() {
    let compiler = Arc::new(StubCompiler::new(Duration::from_millis(50)));
    let service = service_with(2, Arc::clone(&compiler));

    let mut ids = Vec::new();
    for i in 0..12 {
        ids.push(
            service
                .submit(&request(&format!("c{i}.src"), "valid program"))
                .await
                .unwrap(),
        );
    }

    for id in &ids {
        assert_eq!(wait_for_terminal(&service, id).await, JobStatus::Succeeded);
    }

    assert!(
        compiler.max_active() <= 2,
        "observed {} concurrent compilations with a pool of 2",
        compiler.max_active()
    );
}
