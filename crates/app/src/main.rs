//! Tollgate - Main Entry Point
//!
//! A thin composition root: wires the file-backed token store, the reqwest
//! adapters, and the pipeline, then issues a single request from the
//! command line.
//!
//! Usage: `tollgate <METHOD> <PATH>` with `TOLLGATE_BASE_URL` set, e.g.
//! `TOLLGATE_BASE_URL=https://api.example.com/ tollgate GET documents`.

use std::process::ExitCode;
use std::sync::Arc;

use tollgate_application::ports::{RefreshTransport, RequestExecutor};
use tollgate_application::{AuthenticatedPipeline, PipelineConfig, RefreshCoordinator, TokenStore};
use tollgate_domain::{HttpMethod, PipelineOutcome, RequestDescriptor};
use tollgate_infrastructure::{FileTokenPersistence, HttpRefreshTransport, ReqwestRequestExecutor};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use url::Url;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(method), Some(path)) = (args.next(), args.next()) else {
        eprintln!("usage: tollgate <METHOD> <PATH>");
        return Ok(ExitCode::from(64));
    };
    let method: HttpMethod = method.parse()?;

    let base_url = std::env::var("TOLLGATE_BASE_URL")
        .map_err(|_| "TOLLGATE_BASE_URL is not set")?;
    let mut config = PipelineConfig::new(Url::parse(&base_url)?);
    if let Ok(session_file) = std::env::var("TOLLGATE_SESSION_FILE") {
        config = config.with_session_file(session_file.into());
    }

    let pipeline = build_pipeline(&config)?;
    pipeline.hydrate().await;

    let outcome = pipeline.handle(RequestDescriptor::new(method, path)).await;
    Ok(report(&outcome))
}

/// Assembles the pipeline from the configured adapters.
fn build_pipeline(
    config: &PipelineConfig,
) -> Result<AuthenticatedPipeline, Box<dyn std::error::Error>> {
    let persistence = config
        .session_file
        .clone()
        .map(FileTokenPersistence::new)
        .or_else(FileTokenPersistence::at_default_location);

    let store = match persistence {
        Some(persistence) => TokenStore::with_persistence(Arc::new(persistence)),
        None => {
            warn!("no writable data directory; session will not survive this process");
            TokenStore::in_memory()
        }
    };

    let transport: Arc<dyn RefreshTransport> = Arc::new(HttpRefreshTransport::new(config)?);
    let executor: Arc<dyn RequestExecutor> = Arc::new(ReqwestRequestExecutor::new(config)?);
    let coordinator = RefreshCoordinator::new(store.clone(), Arc::clone(&transport))
        .with_timeout(config.refresh_timeout());

    Ok(AuthenticatedPipeline::new(
        store,
        coordinator,
        executor,
        transport,
    ))
}

/// Prints the outcome and picks the exit code.
fn report(outcome: &PipelineOutcome) -> ExitCode {
    match outcome {
        PipelineOutcome::Success(payload) => {
            println!("{}", payload.body_text());
            ExitCode::SUCCESS
        }
        PipelineOutcome::SessionExpired => {
            eprintln!("session expired; please log in again");
            ExitCode::from(2)
        }
        PipelineOutcome::OtherError(kind) => {
            eprintln!("request failed: {kind}");
            ExitCode::FAILURE
        }
    }
}
