//! Panopticon route registration CLI.
//!
//! ```text
//!   artefact (file or flags)            manifest of artefacts
//!           │                                   │
//!           ▼                                   ▼
//!   ┌────────────────┐                 ┌─────────────────┐
//!   │ RouteReconciler│◀────────────────│   SyncService   │◀── interval / file watch
//!   └───────┬────────┘                 └─────────────────┘
//!           │  add_backend → add_route* → commit_routes
//!           ▼
//!   ┌────────────────┐        ┌──────────────────┐
//!   │  Router API    │        │ service discovery│ (backend URLs)
//!   └────────────────┘        └──────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use panopticon::artefact::{load_artefact, Artefact, ArtefactManifest, ManifestError};
use panopticon::config::load_with_env;
use panopticon::config::watcher::ManifestWatcher;
use panopticon::lifecycle::{build_context, signals, Context, Shutdown};
use panopticon::observability::logging::init_logging;
use panopticon::router_api::InMemoryRouterApi;
use panopticon::routing::{sync_all, RouteReconciler, SyncReport, SyncService};

#[derive(Parser)]
#[command(name = "panopticon")]
#[command(about = "Register published content routes with the Router", long_about = None)]
struct Cli {
    /// Configuration file (TOML). Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Record Router API calls and print them instead of sending them.
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the backend and every route of an artefact
    Submit(ArtefactArgs),
    /// Remove every route of an artefact
    Delete(ArtefactArgs),
    /// Register or update the artefact's backend only
    EnsureBackend(ArtefactArgs),
    /// Submit every artefact of a manifest
    Sync {
        /// Manifest file (TOML or JSON).
        #[arg(short, long)]
        manifest: PathBuf,

        /// Re-sync whenever the manifest changes.
        #[arg(long)]
        watch: bool,

        /// Re-sync periodically.
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

#[derive(Args)]
struct ArtefactArgs {
    /// Artefact definition file (TOML or JSON).
    #[arg(
        short,
        long,
        conflicts_with_all = ["slug", "rendering_app", "owning_app", "paths", "prefixes"]
    )]
    artefact: Option<PathBuf>,

    #[arg(long)]
    slug: Option<String>,

    #[arg(long)]
    rendering_app: Option<String>,

    #[arg(long)]
    owning_app: Option<String>,

    /// Exact path (repeatable).
    #[arg(long = "path")]
    paths: Vec<String>,

    /// Path prefix (repeatable).
    #[arg(long = "prefix")]
    prefixes: Vec<String>,
}

impl ArtefactArgs {
    fn into_artefact(self) -> Result<Artefact, ManifestError> {
        match self.artefact {
            Some(path) => load_artefact(&path),
            None => Ok(Artefact {
                slug: self.slug,
                rendering_app: self.rendering_app,
                owning_app: self.owning_app,
                paths: self.paths,
                prefixes: self.prefixes,
            }),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_with_env(cli.config.as_deref())?;
    init_logging(&config.observability)?;

    tracing::debug!(
        router_api = %config.router.url,
        app_domain = %config.discovery.app_domain,
        dry_run = cli.dry_run,
        "Configuration loaded"
    );

    let ctx = build_context(config, cli.dry_run)?;
    let result = run(cli.command, &ctx).await;

    if let Some(recorder) = &ctx.dry_run {
        print_calls(recorder)?;
    }
    result
}

async fn run(command: Commands, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Submit(args) => {
            let artefact = args.into_artefact()?;
            reconciler(&artefact, ctx).submit().await?;
        }
        Commands::Delete(args) => {
            let artefact = args.into_artefact()?;
            reconciler(&artefact, ctx).delete().await?;
        }
        Commands::EnsureBackend(args) => {
            let artefact = args.into_artefact()?;
            reconciler(&artefact, ctx).ensure_application_exists().await?;
        }
        Commands::Sync {
            manifest,
            watch,
            interval_secs,
        } => {
            let loaded = ArtefactManifest::load(&manifest)?;
            let interval = interval_secs.filter(|s| *s > 0).map(Duration::from_secs);

            let report = if watch || interval.is_some() {
                run_sync_service(manifest, loaded, watch, interval, ctx).await?
            } else {
                sync_all(&loaded.artefacts, ctx.router.clone(), ctx.discovery.clone()).await
            };
            check_report(&report)?;
        }
    }
    Ok(())
}

fn reconciler<'a>(artefact: &'a Artefact, ctx: &Context) -> RouteReconciler<'a> {
    RouteReconciler::new(artefact, ctx.router.clone(), ctx.discovery.clone())
}

async fn run_sync_service(
    path: PathBuf,
    manifest: ArtefactManifest,
    watch: bool,
    interval: Option<Duration>,
    ctx: &Context,
) -> Result<SyncReport, Box<dyn std::error::Error>> {
    let shutdown = Arc::new(Shutdown::new());
    let signal_task = signals::spawn_signal_handler(shutdown.clone());

    let (watcher, updates) = if watch {
        let (watcher, updates) = ManifestWatcher::new(&path);
        (Some(watcher.run()?), updates)
    } else {
        let (_, updates) = tokio::sync::mpsc::unbounded_channel();
        (None, updates)
    };

    let service = SyncService::new(
        path,
        manifest,
        interval,
        ctx.router.clone(),
        ctx.discovery.clone(),
    );
    let report = service.run(updates, shutdown.subscribe()).await;

    drop(watcher);
    signal_task.abort();
    tracing::info!("Shutdown complete");
    Ok(report)
}

fn check_report(report: &SyncReport) -> Result<(), Box<dyn std::error::Error>> {
    if report.is_success() {
        return Ok(());
    }
    for failure in &report.failed {
        eprintln!("{}: {}", failure.label, failure.error);
    }
    Err(format!(
        "{} of {} artefacts failed to sync",
        report.failed.len(),
        report.failed.len() + report.submitted
    )
    .into())
}

fn print_calls(recorder: &InMemoryRouterApi) -> Result<(), Box<dyn std::error::Error>> {
    let calls = recorder.calls();
    println!("{}", serde_json::to_string_pretty(&calls)?);
    Ok(())
}
