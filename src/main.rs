#![warn(clippy::all, rust_2018_idioms)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser};
use tracing_subscriber::prelude::*;

use cloudwatch_get::app::config::{self, resolve_aws_target};
use cloudwatch_get::app::data_plane::CloudWatchLogsClient;
use cloudwatch_get::app::error::{ExportError, EXIT_OK, EXIT_USAGE};
use cloudwatch_get::app::local_zone::LocalZone;
use cloudwatch_get::app::{prepare_export, run_export, ExportRequest};

/// Fetch CloudWatch log events for a resolved log group into plain text files.
#[derive(Debug, Parser)]
#[command(
    name = "cloudwatch-get",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT"), ")")
)]
struct Cli {
    /// Base log group name (for example: my-cool-api)
    base_log_group_name: String,

    /// Environment name (for example: sit, pre, prod)
    #[arg(long)]
    env: String,

    /// Window start: YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS
    #[arg(long = "from")]
    from: Option<String>,

    /// Window end: YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS
    #[arg(long = "to")]
    to: Option<String>,

    /// Output directory
    #[arg(long = "out-dir", default_value = ".")]
    out_dir: PathBuf,

    /// AWS profile override
    #[arg(long)]
    profile: Option<String>,

    /// AWS region override
    #[arg(long)]
    region: Option<String>,

    /// Config file (default: search cloudwatch-get.yaml, then ssm-get.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Time zone for window bounds and timestamps: local, utc or +HH:MM
    #[arg(long = "utc-offset")]
    utc_offset: Option<String>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) -> anyhow::Result<()> {
    let crate_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let default_filter = format!(
        "cloudwatch_get={},aws_config=warn,aws_smithy_runtime=warn,aws_sigv4=warn,hyper=warn",
        crate_level
    );

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::builder().parse(&default_filter))
        .context("Failed to parse log filter")?;

    let subscriber = tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false),
    );

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown location".to_string());
        let details = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| panic_info.payload().downcast_ref::<String>().map(|s| s.as_str()))
            .unwrap_or("unknown panic");
        eprintln!(
            "cloudwatch-get crashed!\nPanic occurred at: {}\nDetails: {}",
            location, details
        );
    }));
}

fn run(cli: Cli) -> Result<(), ExportError> {
    let loaded = config::load_config(cli.config.as_deref())?;

    let zone = match cli.utc_offset.as_deref() {
        Some(raw) => raw.parse::<LocalZone>()?,
        None => loaded.config.local_zone()?,
    };

    let request = ExportRequest {
        base_name: cli.base_log_group_name,
        env: cli.env,
        from: cli.from,
        to: cli.to,
        out_dir: cli.out_dir,
    };
    let plan = prepare_export(&request, zone)?;

    let target = resolve_aws_target(
        &loaded.config,
        &plan.base_name,
        &plan.env,
        cli.profile.as_deref(),
        cli.region.as_deref(),
    )
    .inspect_err(|_| {
        if loaded.source.is_none() {
            eprintln!(
                "No config found. Create {} or {} (or pass --config).",
                config::CONFIG_FILE_NAME,
                config::SHARED_CONFIG_FILE_NAME
            );
        }
    })?;
    tracing::info!(
        "Using profile {} in region {} ({} time)",
        target.profile,
        target.region,
        plan.zone
    );

    let mut client = CloudWatchLogsClient::connect(&target)?;
    let report = run_export(&plan, &mut client, &mut std::io::stderr())?;
    tracing::info!(
        "Exported {} stream(s) of {} into {} file(s)",
        report.stream_count,
        report.log_group,
        report.files.len()
    );
    Ok(())
}

fn main() -> ExitCode {
    setup_panic_handler();

    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("{:#}", e);
        return ExitCode::from(EXIT_USAGE);
    }

    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_OK),
        Err(e) => {
            tracing::debug!("Run failed: {:?}", e);
            eprintln!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
