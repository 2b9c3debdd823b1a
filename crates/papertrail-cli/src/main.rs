//! papertrail: bibliometric sweep runner.

use std::path::{Path, PathBuf};

use papertrail_core::inputs::load_ranked_countries;
use papertrail_core::{DataPaths, PipelineConfig};
use papertrail_runtime::{write_json, Orchestrator};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod report;

fn load_config(path: Option<&String>) -> anyhow::Result<PipelineConfig> {
    let path = path.map(PathBuf::from);
    let config = PipelineConfig::load(path.as_deref())?;
    Ok(config)
}

fn print_usage() {
    println!("papertrail: per-country publication sweeps over the OpenAlex catalog");
    println!();
    println!("Usage: papertrail [command]");
    println!();
    println!("Commands:");
    println!("  run [config.json]                Run every pass and write all outputs (default)");
    println!("  graph <summary.json> [config]    Build topic graphs for countries ranked in a summary");
    println!("  help                             Show this help message");
    println!();
    println!("Environment:");
    println!("  PAPERTRAIL_MAILTO        Contact address sent with every request (required)");
    println!("  PAPERTRAIL_BASE_URL      Catalog API base URL");
    println!("  PAPERTRAIL_START_YEAR    First publication year");
    println!("  PAPERTRAIL_END_YEAR      Last publication year");
    println!("  PAPERTRAIL_DATA_DIR      Output directory (default: data)");
    println!("  RUST_LOG                 Log filter (default: info)");
}

async fn run(config: PipelineConfig, paths: &DataPaths) -> anyhow::Result<bool> {
    let orchestrator = Orchestrator::new(config)?;
    let sweep = orchestrator.run().await;
    sweep.persist(paths)?;
    report::print_sweep(&sweep, paths);
    Ok(sweep.is_complete())
}

async fn graph(config: PipelineConfig, summary: &Path, paths: &DataPaths) -> anyhow::Result<bool> {
    let countries = load_ranked_countries(summary, config.graph_countries)?;
    let orchestrator = Orchestrator::new(config)?;
    let graphs = orchestrator.graphs(&countries).await?;

    write_json(&paths.topic_graphs, &graphs.graphs)?;
    write_json(&paths.failures, &graphs.failures)?;
    report::print_graphs(&graphs, paths);
    Ok(graphs.failures.is_empty())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("run");

    let complete = match command {
        "--help" | "-h" | "help" => {
            print_usage();
            return Ok(());
        }
        "run" => {
            let config = load_config(args.get(2))?;
            let paths = DataPaths::from_env()?;
            info!("Data directory: {}", paths.root.display());
            run(config, &paths).await?
        }
        "graph" => {
            let Some(summary) = args.get(2) else {
                eprintln!("Usage: papertrail graph <summary.json> [config.json]");
                std::process::exit(1);
            };
            let config = load_config(args.get(3))?;
            let paths = DataPaths::from_env()?;
            info!("Data directory: {}", paths.root.display());
            graph(config, Path::new(summary), &paths).await?
        }
        other if other.ends_with(".json") => {
            // Bare config path: `papertrail config.json`.
            let config = load_config(args.get(1))?;
            let paths = DataPaths::from_env()?;
            run(config, &paths).await?
        }
        other => {
            eprintln!("Unknown command: {}. Use 'papertrail help' for usage.", other);
            std::process::exit(1);
        }
    };

    std::process::exit(if complete { 0 } else { 2 });
}
