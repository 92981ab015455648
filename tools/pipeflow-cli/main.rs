use clap::{Parser, ValueEnum};
use pipeflow::nodes::output::displayed_value;
use pipeflow::prelude::*;
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Where the acyclicity check runs.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CheckMode {
    /// Check in-process
    Local,
    /// POST the pipeline to the backend
    Remote,
}

/// Loads a pipeline, propagates every value and checks it for cycles
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the pipeline JSON file ({"nodes": [...], "edges": [...]})
    pipeline_path: String,

    /// Where to run the acyclicity check
    #[arg(short, long, value_enum, default_value = "local")]
    check: CheckMode,

    /// Backend base URL (overrides PIPEFLOW_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Request timeout in seconds (overrides PIPEFLOW_TIMEOUT_SECS)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Run every model node through the echo model before checking
    #[arg(long)]
    echo_llm: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let total_start = Instant::now();

    // --- 1. Loading ---
    let json = fs::read_to_string(&cli.pipeline_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read pipeline file '{}': {}",
            &cli.pipeline_path, e
        ))
    });
    let pipeline = Pipeline::from_json(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse pipeline JSON: {}", e)));
    let mut engine = Engine::from_pipeline(pipeline);

    // --- 2. Propagation ---
    let propagate_start = Instant::now();
    match engine.refresh_all() {
        Ok(report) => println!("Recomputed {} nodes", report.recomputed.len()),
        Err(e) => println!("Propagation skipped: {}", e),
    }

    if cli.echo_llm {
        let llm_nodes: Vec<NodeId> = engine
            .store()
            .nodes()
            .iter()
            .filter(|n| n.node_type == NodeType::LlmCall)
            .map(|n| n.id.clone())
            .collect();
        for node_id in llm_nodes {
            match engine.run_llm_call(&node_id, &EchoModel).await {
                Ok(outcome) => println!("Model node {}: {:?}", node_id, outcome),
                Err(e) => println!("Model node {}: {}", node_id, e),
            }
        }
    }
    let propagate_duration = propagate_start.elapsed();

    // --- 3. Values ---
    println!("\n--- Node Values ---");
    for node in engine.store().nodes() {
        let shown = match node.node_type {
            NodeType::Output => OutputDisplay::of(node).to_string(),
            _ => OutputDisplay(displayed_value(node)).to_string(),
        };
        println!("{:<16} {:<14} {}", node.id, node.node_type.as_str(), shown);
    }

    // --- 4. Check ---
    let check_start = Instant::now();
    let summary = match cli.check {
        CheckMode::Local => engine.submit(&LocalChecker).await,
        CheckMode::Remote => {
            let mut config = ClientConfig::from_env()
                .unwrap_or_else(|e| exit_with_error(&format!("Invalid configuration: {}", e)));
            if let Some(url) = cli.base_url {
                config.base_url = url;
            }
            if cli.timeout_secs.is_some() {
                config.timeout_secs = cli.timeout_secs;
            }
            let client = HttpCollaborator::new(config)
                .unwrap_or_else(|e| exit_with_error(&format!("{}", e)));
            engine.submit(&client).await
        }
    }
    .unwrap_or_else(|e| exit_with_error(&format!("Pipeline check failed: {}", e)));
    let check_duration = check_start.elapsed();

    println!("\n--- Pipeline Summary ---");
    println!("{}", summary);

    println!("\n--- Performance Summary ---");
    println!("Propagation:          {:?}", propagate_duration);
    println!("Check:                {:?}", check_duration);
    println!("-----------------------------");
    println!("Total Execution:      {:?}", total_start.elapsed());
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
