//! Contract harness — runs HTTP golden assertions against the tracking
//! service.
//!
//! # Usage
//!
//! ```bash
//! # Run all fixtures against an already-running deployment
//! cargo run -p contract-harness -- --base-url http://localhost:3170
//!
//! # Provision throwaway postgres/redis containers, boot the service
//! # in-process, and run every fixture against it
//! cargo run -p contract-harness --features tracking
//! ```
//!
//! Exits 0 when all assertions pass, exits 1 when any fail.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;

mod config;
mod docker;
mod fixture;
mod reporter;
mod runner;

#[cfg(feature = "tracking")]
mod boot;

use fixture::Fixture;
use reporter::Reporter;
use runner::Runner;

#[derive(Parser)]
#[command(about = "Run HTTP contract assertions against the tracking service")]
struct Args {
    /// Base URL of a running service (e.g. http://localhost:3170).
    /// When omitted, the harness provisions containers and boots the
    /// service in-process (requires --features tracking).
    #[arg(long)]
    base_url: Option<String>,

    /// Run only fixtures under this service directory (e.g. tracking)
    #[arg(long)]
    service: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let workspace_root = workspace_root();
    let fixtures: Vec<Fixture> = fixture::load_all(&workspace_root, args.service.as_deref())?;

    if fixtures.is_empty() {
        eprintln!("No fixtures found.");
        return Ok(());
    }

    let all_passed = match args.base_url {
        Some(base_url) => run_against(&base_url, &fixtures).await,
        None => run_provisioned(&workspace_root, &fixtures).await?,
    };

    if all_passed {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

async fn run_against(base_url: &str, fixtures: &[Fixture]) -> bool {
    println!("Running {} fixture(s) against {}", fixtures.len(), base_url);
    println!();

    let runner = Runner::new(base_url);
    let mut reporter = Reporter::new();

    for f in fixtures {
        let result = runner.run(f).await;
        reporter.record(f, result);
    }

    reporter.print_summary();
    reporter.all_passed()
}

/// Provisioned mode: throwaway containers + in-process service.
#[cfg(feature = "tracking")]
async fn run_provisioned(workspace_root: &Path, fixtures: &[Fixture]) -> Result<bool> {
    use config::ContractHarnessConfig;
    use docker::TestStack;

    let config = ContractHarnessConfig::from_env();

    // One provisioned run per machine at a time; URL mode never locks.
    let lock_path = workspace_root.join("target/contract-harness.lock");
    if let Some(parent) = lock_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut lock = fd_lock::RwLock::new(std::fs::File::create(&lock_path)?);
    let _guard = lock.write()?;

    let mut stack = TestStack::connect(&config.docker_host).await?;
    stack.sweep_leftovers().await.ok();

    let outcome = async {
        let urls = stack.provision().await?;
        let base_url = boot::start_tracking(&urls, &config).await?;
        Ok::<bool, anyhow::Error>(run_against(&base_url, fixtures).await)
    }
    .await;

    stack.teardown().await;
    outcome
}

#[cfg(not(feature = "tracking"))]
async fn run_provisioned(_workspace_root: &Path, _fixtures: &[Fixture]) -> Result<bool> {
    anyhow::bail!(
        "provisioned mode needs the service compiled in; \
         rebuild with --features tracking or pass --base-url"
    )
}

/// Walk up from the binary's own manifest dir to find the workspace root
/// (the directory containing `Cargo.lock`).
fn workspace_root() -> PathBuf {
    let start = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    start
        .ancestors()
        .find(|p| p.join("Cargo.lock").exists())
        .unwrap_or(&start)
        .to_path_buf()
}
