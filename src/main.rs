//! topoaudit CLI entry point.
//!
//! Provides `check`, `policy` and `classify` subcommands for running an
//! audit against a cluster snapshot, printing the effective policy, or
//! explaining how a single workload is treated.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, error, info};

use topoaudit::audit::{AuditEngine, AuditStatus, Classifier};
use topoaudit::config::{self, Config};
use topoaudit::inventory::snapshot::SnapshotFeed;
use topoaudit::inventory::{collect_inventory, InventoryError, TopologyFeed};
use topoaudit::policy::{load_policy, PolicyDocument};
use topoaudit::sink::{sink_for, ReportFormat};
use topoaudit::types::{ClusterTopology, TopologyMode, WorkloadKind, WorkloadRef};

/// Exit code for a run with violations.
const EXIT_FAILED: u8 = 1;
/// Exit code for a skipped run when skips are treated as failures.
const EXIT_SKIPPED: u8 = 2;
/// Exit code when the audit could not run at all.
const EXIT_ERROR: u8 = 3;

/// topoaudit: verify platform workloads run one replica under single-replica topology.
#[derive(Parser)]
#[command(name = "topoaudit", version, about)]
struct Cli {
    /// Path to `topoaudit.toml` (default: `~/.topoaudit/topoaudit.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Policy file replacing the `[policy]` section of the config.
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    /// Default log level when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Audit a cluster snapshot.
    Check(CheckArgs),
    /// Print the effective policy as TOML.
    Policy,
    /// Show how one workload is classified.
    Classify {
        /// Workload namespace.
        #[arg(long)]
        namespace: String,
        /// Workload name.
        #[arg(long)]
        name: String,
        /// Deployment or StatefulSet.
        #[arg(long, default_value = "Deployment")]
        kind: WorkloadKind,
    },
}

/// Arguments for `check`.
#[derive(clap::Args)]
struct CheckArgs {
    /// JSON list of Deployments and StatefulSets (`oc get deploy,sts -A -o json`).
    #[arg(long)]
    workloads: PathBuf,

    /// JSON `Infrastructure` object (`oc get infrastructure cluster -o json`).
    #[arg(long)]
    infrastructure: Option<PathBuf>,

    /// Control-plane topology, overriding the snapshot.
    #[arg(long)]
    control_plane_topology: Option<TopologyMode>,

    /// Infrastructure topology, overriding the snapshot.
    #[arg(long)]
    infrastructure_topology: Option<TopologyMode>,

    /// Output format, overriding the config.
    #[arg(long, value_enum)]
    format: Option<ReportFormat>,

    /// Exit with status 2 when the audit does not apply.
    #[arg(long)]
    fail_on_skip: bool,

    /// Also write JSON logs to this directory (daily rotation).
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "topoaudit could not complete");
            eprintln!("Error: {e:?}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Dispatch the selected subcommand.
async fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Command::Check(ref args) => handle_check(cli, args).await,
        Command::Policy => handle_policy(cli),
        Command::Classify {
            ref namespace,
            ref name,
            kind,
        } => handle_classify(cli, namespace, name, kind),
    }
}

/// Load the config and resolve the policy it selects.
fn load_settings(cli: &Cli) -> anyhow::Result<(Config, PolicyDocument)> {
    let config = config::load_or_default(cli.config.as_deref())?;
    let policy = match cli.policy.as_deref() {
        Some(path) => load_policy(path)
            .with_context(|| format!("failed to load policy {}", path.display()))?,
        None => config.policy.clone(),
    };
    Ok((config, policy))
}

/// Run an audit against snapshot files.
async fn handle_check(cli: &Cli, args: &CheckArgs) -> anyhow::Result<ExitCode> {
    let _logging_guard = match args.log_dir.as_deref() {
        Some(dir) => Some(topoaudit::logging::init_with_file(dir, &cli.log_level)?),
        None => {
            topoaudit::logging::init_cli(&cli.log_level);
            None
        }
    };

    let (config, policy) = load_settings(cli)?;

    let feed = SnapshotFeed::load(&args.workloads, args.infrastructure.as_deref())
        .await
        .context("failed to load cluster snapshot")?;

    let topology = resolve_topology(
        &feed,
        args.control_plane_topology,
        args.infrastructure_topology,
    )
    .await
    .context("failed to determine cluster topology")?;

    let inventory = collect_inventory(&feed, &config.inventory.namespace_prefix)
        .await
        .context("failed to collect inventory")?;
    info!(
        workloads = inventory.len(),
        prefix = %config.inventory.namespace_prefix,
        "inventory collected"
    );

    let engine = AuditEngine::new(Classifier::from_policy(policy));
    let report = engine
        .run_concurrent(inventory, topology, config.audit.workers)
        .await?;

    let format = args.format.unwrap_or(config.report.format);
    let stdout = std::io::stdout();
    sink_for(format, stdout.lock()).emit(&report)?;

    let fail_on_skip = args.fail_on_skip || config.audit.fail_on_skip;
    let code = match report.into_result() {
        Ok(report) if report.status == AuditStatus::Skipped && fail_on_skip => {
            ExitCode::from(EXIT_SKIPPED)
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(failure) => {
            debug!(violations = failure.violations.len(), "audit failed");
            ExitCode::from(EXIT_FAILED)
        }
    };
    Ok(code)
}

/// Topology from flags, falling back to the snapshot per dimension.
async fn resolve_topology(
    feed: &dyn TopologyFeed,
    control_plane: Option<TopologyMode>,
    infrastructure: Option<TopologyMode>,
) -> Result<ClusterTopology, InventoryError> {
    if let (Some(cp), Some(infra)) = (control_plane, infrastructure) {
        return Ok(ClusterTopology::new(cp, infra));
    }
    let snapshot = feed.topology().await?;
    Ok(ClusterTopology::new(
        control_plane.unwrap_or(snapshot.control_plane),
        infrastructure.unwrap_or(snapshot.infrastructure),
    ))
}

/// Print the effective policy.
fn handle_policy(cli: &Cli) -> anyhow::Result<ExitCode> {
    topoaudit::logging::init_cli(&cli.log_level);
    let (_, policy) = load_settings(cli)?;
    print!("{}", policy.to_toml()?);
    Ok(ExitCode::SUCCESS)
}

/// Explain how one workload is treated.
fn handle_classify(
    cli: &Cli,
    namespace: &str,
    name: &str,
    kind: WorkloadKind,
) -> anyhow::Result<ExitCode> {
    topoaudit::logging::init_cli(&cli.log_level);
    let (config, policy) = load_settings(cli)?;
    let classifier = Classifier::from_policy(policy);

    let workload = WorkloadRef {
        name: name.to_owned(),
        namespace: namespace.to_owned(),
        kind,
        declared_replicas: None,
    };
    let in_scope = topoaudit::inventory::is_platform_namespace(
        namespace,
        &config.inventory.namespace_prefix,
    );

    println!("workload:       {workload}");
    println!("in scope:       {in_scope}");
    println!("classification: {:?}", classifier.classify(&workload));
    println!(
        "allow-listed:   {}",
        classifier.is_allowed_to_fail(&workload)
    );
    Ok(ExitCode::SUCCESS)
}
