//! blok-sync - upload theme files to blok

use std::path::PathBuf;

use anyhow::Result;
use blok_sync::collect::{build_excludes, collect_paths, common_base};
use blok_sync::config::{ConfigOptions, SessionConfig};
use blok_sync::service::HttpGateway;
use blok_sync::upload::{AdmissionScheduler, FileEntry};
use clap::Parser;
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Number of files read from disk concurrently
const READ_CONCURRENCY: usize = 16;

#[derive(Parser, Debug)]
#[command(name = "blok-sync")]
#[command(about = "Upload local theme files as assets to blok")]
struct Args {
    /// Developer API key
    #[arg(long, env = "BLOK_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Theme (v1) or space (v2) id to upload into
    #[arg(long)]
    theme_id: String,

    /// Legacy API host, required for --api-version 1
    #[arg(long)]
    host: Option<String>,

    /// Remote API protocol version
    #[arg(long, default_value_t = 1)]
    api_version: u32,

    /// Environment tag attached to v2 templates
    #[arg(long)]
    env: Option<String>,

    /// Directory asset keys are relative to (defaults to the deepest directory
    /// containing every input)
    #[arg(long)]
    base_path: Option<PathBuf>,

    /// Glob patterns to skip, matched against paths relative to their input
    #[arg(long)]
    exclude: Vec<String>,

    /// Files or directories to upload
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

async fn read_entry(path: PathBuf, base: PathBuf) -> Option<FileEntry> {
    match tokio::fs::read(&path).await {
        Ok(bytes) => Some(FileEntry::buffer(&path, &base, bytes)),
        Err(e) => {
            warn!("Failed to read file {}: {}", path.display(), e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let base = match args.base_path {
        Some(base) => base,
        None => common_base(&args.inputs)?,
    };
    info!("Asset keys are relative to {}", base.display());

    let config = SessionConfig::new(
        args.api_key,
        args.theme_id,
        ConfigOptions {
            host: args.host,
            api_version: Some(args.api_version),
            environment: args.env,
            base_path: Some(base.clone()),
            ..ConfigOptions::default()
        },
    )?;

    let excludes = build_excludes(&args.exclude)?;
    let paths = collect_paths(&args.inputs, &excludes);
    info!("Found {} files", paths.len());

    let gateway = HttpGateway::new(&config)?;
    let (mut scheduler, mut completions) = AdmissionScheduler::new(config, gateway)?;

    let drain = tokio::spawn(async move {
        let mut completed = 0usize;
        while let Some(completion) = completions.recv().await {
            debug!("Completed {}", completion.file);
            completed += 1;
        }
        completed
    });

    // buffered keeps arrival order, so admission order matches the input order
    let mut entries = stream::iter(paths)
        .map(|path| read_entry(path, base.clone()))
        .buffered(READ_CONCURRENCY);

    let mut forwarded = 0usize;
    while let Some(entry) = entries.next().await {
        let Some(entry) = entry else { continue };
        match scheduler.submit(entry) {
            Ok(_) => forwarded += 1,
            Err(e) => error!("{}", e),
        }
    }
    debug!("Forwarded {} files", forwarded);

    let report = scheduler.finish().await;
    let completed = drain.await.unwrap_or_default();
    info!("{} completions received", completed);

    if report.failed > 0 {
        error!("{} uploads failed", report.failed);
        std::process::exit(1);
    }

    Ok(())
}
