#![warn(clippy::all, rust_2018_idioms)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::prelude::*;

use logsdash::app::api_server::{ApiServer, API_TOKEN_HEADER};
use logsdash::app::config::LogsConfig;
use logsdash::app::data_plane::cloudwatch_logs::CloudWatchLogsClient;
use logsdash::app::log_actions::{LogActionBatch, LogActionExecutor};

const DEFAULT_LOG_FILTER: &str =
    "logsdash=info,aws_config=warn,aws_sigv4=warn,aws_smithy_runtime=warn,aws_smithy_runtime_api=warn,hyper=warn";

#[derive(Debug, Parser)]
#[command(name = "logsdash", version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT"), ")"))]
#[command(about = "Run CloudWatch Logs Insights queries and get tabular results")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log to stderr instead of the log file
    #[arg(long, global = true)]
    stderr: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve log action batches over HTTP
    Serve {
        /// Listen address, overriding the config file
        #[arg(long)]
        bind: Option<String>,
    },
    /// Execute one batch from a JSON file ("-" for stdin) and print the response
    Run {
        batch: PathBuf,
        /// Exit non-zero if any refId failed
        #[arg(long)]
        strict: bool,
    },
}

fn init_logging(to_stderr: bool) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::builder().parse(DEFAULT_LOG_FILTER))
        .context("Failed to parse log filter")?;

    // Our own `log` records are already emitted through tracing by the log_* macros
    tracing_log::LogTracer::builder()
        .ignore_crate("logsdash")
        .init()
        .context("Failed to initialize log-to-tracing bridge")?;

    if to_stderr {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("Failed to set tracing subscriber")?;
        return Ok(());
    }

    let proj_dirs = directories::ProjectDirs::from("com", "", "logsdash")
        .context("Could not determine the data directory")?;
    let log_dir = proj_dirs.data_dir().join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;

    let log_path = log_dir.join("logsdash.log");
    let file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    // Owner read/write only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = std::fs::set_permissions(&log_path, std::fs::Permissions::from_mode(0o600)) {
            eprintln!("[SECURITY] Failed to set log file permissions: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false),
        )
        .try_init()
        .context("Failed to set tracing subscriber")?;

    tracing::info!("Logging initialized to: {:?}", log_path);
    Ok(())
}

fn crash_log_path() -> Option<PathBuf> {
    let log_dir = directories::ProjectDirs::from("com", "", "logsdash")?
        .data_dir()
        .join("logs");
    std::fs::create_dir_all(&log_dir).ok()?;
    Some(log_dir.join("crash.log"))
}

/// Append panics to crash.log; works before logging is initialized
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        let crash_msg = format!(
            "{}\n{}",
            panic_info,
            std::backtrace::Backtrace::force_capture()
        );
        eprintln!("logsdash crashed: {}", crash_msg);

        let Some(path) = crash_log_path() else { return };
        if let Ok(mut file) = std::fs::OpenOptions::new().append(true).create(true).open(&path) {
            use std::io::Write;
            let _ = writeln!(file, "=== {} ===\n{}", chrono::Local::now().to_rfc3339(), crash_msg);
            eprintln!("Crash log written to: {:?}", path);
        }
    }));
}

fn read_batch(path: &Path) -> anyhow::Result<LogActionBatch> {
    let contents = if path.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin()).context("Failed to read batch from stdin")?
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read batch file {:?}", path))?
    };

    serde_json::from_str(&contents).context("Failed to parse batch JSON")
}

async fn build_executor(config: &LogsConfig) -> anyhow::Result<LogActionExecutor> {
    let client = CloudWatchLogsClient::from_config(config).await?;
    Ok(LogActionExecutor::with_settings(
        Arc::new(client),
        config.queries.clone(),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_panic_handler();

    let cli = Cli::parse();
    init_logging(cli.stderr)?;

    tracing::info!(
        "logsdash {} ({}, {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_BRANCH"),
        env!("GIT_COMMIT")
    );

    let config = LogsConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Serve { bind } => {
            let executor = build_executor(&config).await?;
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let mut server = ApiServer::start(&bind, executor).await?;

            println!("Listening on {}", server.base_url());
            println!("Send the API token in the {} header:", API_TOKEN_HEADER);
            println!("{}", server.token());

            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for shutdown signal")?;
            server.shutdown().await;
        }
        Command::Run { batch, strict } => {
            let batch = read_batch(&batch)?;
            let executor = build_executor(&config).await?;
            let response = executor.execute_batch(batch).await;

            println!("{}", serde_json::to_string_pretty(&response)?);

            if strict {
                if let Some((ref_id, error)) = response.first_error() {
                    anyhow::bail!("refId {} failed: {}", ref_id, error);
                }
            }
        }
    }

    Ok(())
}
