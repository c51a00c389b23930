use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use opentelemetry_otlp::WithExportConfig;
use owo_colors::OwoColorize;
use quest_common::config::{QuestConfig, SchedulePolicy};
use quest_common::{messages, QuestError};
use quest_core::{Dashboard, Runner};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "quest", version, about = "Replays messages against an agent for each wallet and reports usage")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Run(RunArgs),
    Version,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Exit after a single cycle instead of restarting on a timer
    #[arg(long)]
    once: bool,
    /// Message file (JSON array of strings)
    #[arg(short, long)]
    messages: Option<PathBuf>,
    /// Seconds to wait between cycles
    #[arg(long)]
    restart_secs: Option<u64>,
    /// Stop after this many cycles
    #[arg(long)]
    cycles: Option<u64>,
    /// Serve Prometheus metrics on this address
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => {
            if let Err(e) = run(args).await {
                eprintln!("{}", format!("Error: {e:#}").red());
                if let Some(QuestError::MissingEnv(_)) = e.downcast_ref::<QuestError>() {
                    eprintln!("{}", "Please ensure WALLET_ADDRESSES and AGENT_ID are set in your .env file.".red());
                }
                std::process::exit(1);
            }
        }
        Commands::Version => println!("{}", env!("CARGO_PKG_VERSION")),
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let mut cfg = QuestConfig::from_env()?;
    apply_args(&mut cfg, &args);
    let messages = messages::load(&cfg.messages_path)?;
    tracing::info!(
        wallets = cfg.wallets.len(),
        messages = messages.len(),
        agent = %cfg.endpoints.agent_url,
        "configuration loaded"
    );

    if let Some(addr) = args.metrics_addr {
        quest_obs::spawn_server(addr).await?;
    }

    let mut runner = Runner::from_config(&cfg, messages)?;
    if let Some(n) = args.cycles {
        runner = runner.with_max_cycles(n);
    }
    let mut dashboard = Dashboard::stdout();

    if let Ended::Interrupted = until_interrupted(runner.run(&mut dashboard), tokio::signal::ctrl_c()).await {
        println!("{}", "\nScript terminated by user. Exiting...".yellow());
        std::process::exit(0);
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Ended {
    Finished,
    Interrupted,
}

/// Races `work` against `interrupt`. A failed signal listener leaves `work` running.
async fn until_interrupted<W, I>(work: W, interrupt: I) -> Ended
where
    W: std::future::Future,
    I: std::future::Future<Output = std::io::Result<()>>,
{
    tokio::pin!(work);
    let signal = tokio::select! {
        _ = &mut work => return Ended::Finished,
        signal = interrupt => signal,
    };
    match signal {
        Ok(()) => Ended::Interrupted,
        Err(e) => {
            tracing::warn!("cannot listen for Ctrl-C: {}", e);
            work.await;
            Ended::Finished
        }
    }
}

fn apply_args(cfg: &mut QuestConfig, args: &RunArgs) {
    if let Some(path) = &args.messages {
        cfg.messages_path = path.clone();
    }
    if let Some(secs) = args.restart_secs.filter(|s| *s > 0) {
        if let SchedulePolicy::Repeat(_) = cfg.schedule {
            cfg.schedule = SchedulePolicy::Repeat(Duration::from_secs(secs));
        }
    }
    if args.once {
        cfg.schedule = SchedulePolicy::Once;
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "error".into()),
    );
    let fmt = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic().with_endpoint(endpoint))
            .install_simple()
            .ok();
        if let Some(tracer) = tracer {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt)
                .with(OpenTelemetryLayer::new(tracer))
                .init();
            return;
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt)
        .init();
}
