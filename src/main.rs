use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use sakila_etl::config::AppConfig;
use sakila_etl::etl::{sakila_graph, EtlError, PipelineManager, RunReport, TaskId, TaskOutput};
use sakila_etl::logging::init_logging;
use sakila_etl::store::MySqlConnector;

#[derive(Parser, Debug)]
#[command(name = "sakila-etl")]
#[command(about = "Rebuild the Sakila rental warehouse from the operational database")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Print reports and logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the whole task graph
    Run,
    /// Run one task on its own (e.g. `film` or `run_rental_etl`)
    Task {
        #[arg(value_parser = parse_task)]
        name: TaskId,
    },
    /// Print the task graph in execution order
    Graph,
}

fn parse_task(s: &str) -> Result<TaskId, String> {
    s.parse().map_err(|e: sakila_etl::dag::DagError| e.to_string())
}

#[derive(Serialize)]
struct GraphEntry {
    task: TaskId,
    depends_on: Vec<TaskId>,
}

#[derive(Serialize)]
struct SingleTaskReport<'a> {
    task: TaskId,
    rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    exclusions: Option<sakila_etl::transform::ExclusionCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    init_logging(cli.json);

    let result = match cli.command {
        Command::Graph => print_graph(cli.json),
        Command::Run => run_all(cli.json).await,
        Command::Task { name } => run_task(name, cli.json).await,
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "sakila-etl failed");
            ExitCode::FAILURE
        }
    }
}

fn build_manager(cancel: &CancellationToken) -> Result<PipelineManager, EtlError> {
    let config = AppConfig::from_env()?;
    info!(
        source = %config.source,
        warehouse = %config.warehouse,
        workers = config.pipeline.worker_num,
        batch_size = config.pipeline.batch_size,
        "configuration loaded"
    );

    let connector = Arc::new(MySqlConnector::new(
        config.source.clone(),
        config.warehouse.clone(),
        config.pipeline.batch_size,
    ));

    let cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing running tasks");
            cancel.cancel();
        }
    });

    PipelineManager::sakila(&config.pipeline, connector)
}

async fn run_all(json: bool) -> Result<bool, EtlError> {
    let cancel = CancellationToken::new();
    let manager = build_manager(&cancel)?;
    let report = manager.run_all(&cancel).await?;
    print_report(&report, json)?;
    Ok(report.is_success())
}

async fn run_task(id: TaskId, json: bool) -> Result<bool, EtlError> {
    let cancel = CancellationToken::new();
    let manager = build_manager(&cancel)?;
    let result = manager.run_task(id, &cancel).await;

    let error = result.as_ref().err().map(ToString::to_string);
    let report = SingleTaskReport {
        task: id,
        rows: result.as_ref().map_or(0, TaskOutput::rows),
        exclusions: result.as_ref().ok().and_then(TaskOutput::exclusions),
        error: error.as_deref(),
    };
    if json {
        println!("{}", to_json(&report)?);
    } else {
        match report.error {
            Some(e) => println!("{:<18} failed: {}", id.name(), e),
            None => println!("{:<18} succeeded ({} rows)", id.name(), report.rows),
        }
    }
    Ok(result.is_ok())
}

fn print_graph(json: bool) -> Result<bool, EtlError> {
    let graph = sakila_graph()?;
    let entries: Vec<GraphEntry> = graph
        .topological_order()?
        .into_iter()
        .map(|task| GraphEntry {
            task,
            depends_on: graph.dependencies(&task).collect(),
        })
        .collect();

    if json {
        println!("{}", to_json(&entries)?);
        return Ok(true);
    }
    for entry in entries {
        let deps: Vec<&str> = entry.depends_on.iter().map(|id| id.name()).collect();
        if deps.is_empty() {
            println!("{}", entry.task);
        } else {
            println!("{} <- {}", entry.task, deps.join(", "));
        }
    }
    Ok(true)
}

fn print_report(report: &RunReport, json: bool) -> Result<(), EtlError> {
    if json {
        println!("{}", to_json(report)?);
        return Ok(());
    }

    for task in &report.tasks {
        let mut line = format!("{:<18} {:<9}", task.task.name(), task.state.to_string());
        if let Some(rows) = task.rows {
            line.push_str(&format!(" rows={}", rows));
        }
        if let Some(exclusions) = task.exclusions.filter(|e| !e.is_empty()) {
            line.push_str(&format!(" excluded={}", exclusions.excluded));
        }
        if let Some(error) = &task.error {
            line.push_str(&format!(" error=\"{}\"", error));
        }
        if !task.blocked_by.is_empty() {
            let blocked: Vec<&str> = task.blocked_by.iter().map(|id| id.name()).collect();
            line.push_str(&format!(" blocked_by={}", blocked.join(",")));
        }
        println!("{}", line);
    }
    if report.cancelled {
        println!("run cancelled");
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, EtlError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| EtlError::Configuration(format!("report serialization: {}", e)))
}
