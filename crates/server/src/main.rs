mod metrics;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use futures::future::join_all;
use sha2::{Digest, Sha256};
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use handoff_core::{
    command_channel, load_config, validate_config, Config, DuplicateTransfer, FsProvisioner,
    GenerationCoordinator, LocalWorker, LogFormat, StaticContent, TargetContext,
    GENERATION_FAILED,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Written into every output file when no content file is configured.
const DEFAULT_CONTENT: &[u8] = b"handoff\n";

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            eprintln!("handoffd: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Runs one generation per output path. Returns whether every job succeeded.
async fn run() -> Result<bool> {
    let outputs: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if outputs.is_empty() {
        bail!("usage: handoffd <output-path>...");
    }

    // Determine config path
    let config_path = std::env::var("HANDOFF_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    init_logging(config.logging.format);

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config = ?config_path,
        config_hash = &config_hash[..16],
        "Configuration loaded"
    );

    let content = load_content(&config).await?;

    let provisioner = Arc::new(FsProvisioner::new(
        config.provisioner.clone(),
        Arc::new(DuplicateTransfer::new()),
    ));

    // The worker reports through a handle, so the channel comes first.
    let (handle, commands) = command_channel(config.coordinator.command_buffer);
    let worker = Arc::new(LocalWorker::new(
        config.worker.clone(),
        Arc::new(content),
        handle.clone(),
    ));
    let coordinator =
        GenerationCoordinator::new(config.coordinator.clone(), commands, provisioner, worker);
    let coordinator_task = tokio::spawn(coordinator.run());
    info!("Coordinator started");

    let started_at = Utc::now();
    let pid = std::process::id();
    let mut receivers = Vec::with_capacity(outputs.len());
    for (session, output) in (1u32..).zip(&outputs) {
        let (tx, rx) = oneshot::channel();
        let id = handle
            .start(TargetContext::new(pid, session), output, move |path, size| {
                let _ = tx.send((path.to_path_buf(), size));
            })
            .await;
        debug!(job_id = %id, path = ?output, "Job submitted");
        receivers.push(rx);
    }

    let pending = join_all(receivers);
    tokio::pin!(pending);
    let results = tokio::select! {
        results = &mut pending => results,
        _ = shutdown_signal() => {
            warn!("Interrupted, failing outstanding jobs");
            handle.shutdown().await;
            pending.await
        }
    };

    if let Ok(status) = handle.status().await {
        debug!(
            status = %serde_json::to_string(&status).unwrap_or_default(),
            "Coordinator status"
        );
    }

    handle.shutdown().await;
    drop(handle);
    if let Err(e) = coordinator_task.await {
        error!("Coordinator task failed: {}", e);
    }
    info!("Coordinator stopped");

    let mut all_succeeded = true;
    for (output, result) in outputs.iter().zip(results) {
        let (path, size) = result.unwrap_or_else(|_| (output.clone(), GENERATION_FAILED));
        if size == GENERATION_FAILED {
            all_succeeded = false;
        }
        println!("{}\t{}", path.display(), size);
    }

    let elapsed = Utc::now() - started_at;
    info!(
        jobs = outputs.len(),
        all_succeeded,
        elapsed_ms = elapsed.num_milliseconds(),
        "All jobs finished"
    );
    if config.logging.dump_metrics {
        eprint!("{}", metrics::encode_metrics());
    }

    Ok(all_succeeded)
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries results only
    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

async fn load_content(config: &Config) -> Result<StaticContent> {
    match &config.worker.content_path {
        Some(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read content from {:?}", path))?;
            info!(path = ?path, size = bytes.len(), "Loaded worker content");
            Ok(StaticContent::new(bytes))
        }
        None => Ok(StaticContent::new(DEFAULT_CONTENT)),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
