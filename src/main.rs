use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lovejs_bundler::{
    bundle_components, BundleOptions, BundlePlan, ComponentDefinition, DEFAULT_SCRIPT_COMPONENT,
};

/// Extract embedded component scripts and write them as bundle files.
#[derive(Debug, Parser)]
#[command(name = "lovejs-bundler", version)]
struct Cli {
    /// Project directory; bundles go to `<project-root>/wwwroot/loveJS`.
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    /// Write bundles here instead of the project convention.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// JSON payload file. Read from stdin when omitted.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Type name of the script component.
    #[arg(long, default_value = DEFAULT_SCRIPT_COMPONENT)]
    script_component: String,

    /// Emit `AsClass` scripts as members of a synthetic class.
    #[arg(long)]
    wrap_in_class: bool,

    /// Print the bundle report as JSON instead of writing files.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BundlerInput {
    components: Vec<ComponentDefinition>,
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(err) = run(Cli::parse()).await {
        eprintln!("[lovejs-bundler] {err:#}");
        process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let payload = read_payload(cli.input.as_ref())?;
    if payload.trim().is_empty() {
        anyhow::bail!("input payload is empty");
    }

    let input: BundlerInput = serde_json::from_str(&payload)
        .map_err(|e| anyhow::anyhow!("invalid input JSON: {e}"))?;

    let mut plan = BundlePlan::new(cli.project_root, input.components);
    plan.out_dir = cli.out_dir;

    let opts = BundleOptions {
        script_component: cli.script_component,
        wrap_in_class: cli.wrap_in_class,
        write_to_disk: !cli.dry_run,
    };

    let result = bundle_components(plan, opts).await?;

    if cli.dry_run {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for bundle in &result.bundles {
            tracing::info!(key = %bundle.key, file = %bundle.file_name, "emitted bundle");
        }
    }
    Ok(())
}

fn read_payload(input: Option<&PathBuf>) -> anyhow::Result<String> {
    match input {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read '{}': {e}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| anyhow::anyhow!("failed to read stdin: {e}"))?;
            Ok(buf)
        }
    }
}
