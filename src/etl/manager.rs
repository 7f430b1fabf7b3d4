use std::collections::BTreeMap;
use std::sync::Arc;

use derive_builder::Builder;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::dag::{DagError, GraphRun, TaskGraph, TaskState};
use crate::etl::{ETLPipeline, ETLPipelineAdapter, ETLRunner, EtlError, TaskId, TaskOutput, Upstream};
use crate::pipelines::{CustomerETL, DateETL, FilmETL, RentalETL, StoreETL};
use crate::store::Connector;
use crate::transform::ExclusionCounts;

fn default_worker_num() -> usize {
    num_cpus::get().clamp(1, TaskId::DIMENSIONS.len())
}

/// Configuration for ETL pipeline execution
#[derive(Debug, Clone, Builder)]
pub struct Config {
    /// Maximum number of tasks running at the same time
    #[builder(default = "default_worker_num()")]
    pub worker_num: usize,

    /// Rows per INSERT statement when loading a table
    #[builder(default = "500")]
    pub batch_size: usize,
}

impl Config {
    pub fn new(worker_num: usize, batch_size: usize) -> Self {
        Config {
            worker_num,
            batch_size,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            worker_num: default_worker_num(),
            batch_size: 500,
        }
    }
}

/// Shape of the rental warehouse graph, without any runners attached.
pub fn sakila_graph() -> Result<TaskGraph<TaskId>, DagError> {
    let mut graph = TaskGraph::new();
    for id in TaskId::ALL {
        graph.add_task(id)?;
    }
    graph.add_fan_in(&TaskId::DIMENSIONS, TaskId::Rental)?;
    Ok(graph)
}

/// Final state of one task after a run.
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub task: TaskId,
    pub state: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusions: Option<ExclusionCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<TaskId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub tasks: Vec<TaskReport>,
    pub cancelled: bool,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        !self.cancelled && self.tasks.iter().all(|t| t.state == TaskState::Succeeded)
    }

    pub fn task(&self, id: TaskId) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.task == id)
    }

    pub fn failed(&self) -> impl Iterator<Item = &TaskReport> {
        self.tasks.iter().filter(|t| t.state == TaskState::Failed)
    }
}

/// Runs ETL tasks in dependency order, starting every task whose upstream
/// tasks have succeeded and capping concurrency at `worker_num`.
pub struct PipelineManager {
    cfg: Config,
    graph: TaskGraph<TaskId>,
    runners: BTreeMap<TaskId, Arc<dyn ETLRunner>>,
    connector: Arc<dyn Connector>,
}

impl PipelineManager {
    pub fn new(cfg: &Config, connector: Arc<dyn Connector>) -> Self {
        PipelineManager {
            cfg: cfg.clone(),
            graph: TaskGraph::new(),
            runners: BTreeMap::new(),
            connector,
        }
    }

    /// The rental warehouse graph: four independent dimension tasks feeding
    /// the rental fact task.
    pub fn sakila(cfg: &Config, connector: Arc<dyn Connector>) -> Result<Self, EtlError> {
        let mut manager = PipelineManager::new(cfg, connector);
        manager.add_pipeline(TaskId::Date, DateETL)?;
        manager.add_pipeline(TaskId::Film, FilmETL)?;
        manager.add_pipeline(TaskId::Store, StoreETL)?;
        manager.add_pipeline(TaskId::Customer, CustomerETL)?;
        manager.add_pipeline(TaskId::Rental, RentalETL)?;
        manager
            .graph
            .add_fan_in(&TaskId::DIMENSIONS, TaskId::Rental)?;
        Ok(manager)
    }

    /// Add an ETL pipeline; this wraps it in an [`ETLPipelineAdapter`].
    pub fn add_pipeline<P>(&mut self, id: TaskId, pipeline: P) -> Result<(), EtlError>
    where
        P: ETLPipeline + 'static,
    {
        self.add_runner(Arc::new(ETLPipelineAdapter::new(id, pipeline)))
    }

    /// Add an ETLRunner directly to the manager
    pub fn add_runner(&mut self, runner: Arc<dyn ETLRunner>) -> Result<(), EtlError> {
        let id = runner.id();
        self.graph.add_task(id)?;
        self.runners.insert(id, runner);
        Ok(())
    }

    pub fn add_dependency(&mut self, before: TaskId, after: TaskId) -> Result<(), EtlError> {
        self.graph.add_dependency(before, after)?;
        Ok(())
    }

    pub fn graph(&self) -> &TaskGraph<TaskId> {
        &self.graph
    }

    /// Runs a single task on its own, with no upstream outputs.
    pub async fn run_task(
        &self,
        id: TaskId,
        cancel: &CancellationToken,
    ) -> Result<TaskOutput, EtlError> {
        let runner = self
            .runners
            .get(&id)
            .ok_or_else(|| DagError::UnknownNode(id.to_string()))?;
        info!(task = %id, "running single task");
        let result = runner
            .run(self.connector.as_ref(), &Upstream::default(), cancel)
            .await;
        if let Err(e) = &result {
            error!(task = %id, error = %e, "task failed");
        }
        result
    }

    /// Runs the whole graph. Task failures are reported, not returned; the
    /// `Err` case is reserved for a malformed graph.
    pub async fn run_all(&self, cancel: &CancellationToken) -> Result<RunReport, EtlError> {
        let order = self.graph.topological_order()?;
        let mut run = GraphRun::new(&self.graph);
        let mut outputs = Upstream::default();
        let mut errors: BTreeMap<TaskId, String> = BTreeMap::new();

        let semaphore = Arc::new(Semaphore::new(self.cfg.worker_num.max(1)));
        let mut running = JoinSet::new();

        loop {
            if !cancel.is_cancelled() {
                for id in run.ready(&self.graph) {
                    let runner = self
                        .runners
                        .get(&id)
                        .cloned()
                        .ok_or_else(|| DagError::UnknownNode(id.to_string()))?;
                    run.transition(id, TaskState::Running)?;

                    let upstream = outputs.subset(self.graph.dependencies(&id));
                    let connector = Arc::clone(&self.connector);
                    let semaphore = Arc::clone(&semaphore);
                    let cancel = cancel.clone();

                    running.spawn(async move {
                        let task = tokio::spawn(async move {
                            let _permit = semaphore
                                .acquire_owned()
                                .await
                                .map_err(|_| EtlError::Cancelled)?;
                            runner.run(connector.as_ref(), &upstream, &cancel).await
                        });
                        let result = match task.await {
                            Ok(result) => result,
                            Err(_) => Err(EtlError::TaskPanicked(id.to_string())),
                        };
                        (id, result)
                    });
                }
            }

            let Some(joined) = running.join_next().await else {
                break;
            };
            let (id, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    error!(error = %e, "scheduler task aborted");
                    continue;
                }
            };

            match result {
                Ok(output) => {
                    run.transition(id, TaskState::Succeeded)?;
                    info!(task = %id, rows = output.rows(), "task succeeded");
                    outputs.insert(id, output);
                }
                Err(e) => {
                    run.transition(id, TaskState::Failed)?;
                    error!(task = %id, error = %e, "task failed");
                    errors.insert(id, e.to_string());
                }
            }
        }

        let cancelled = cancel.is_cancelled();
        let tasks: Vec<TaskReport> = order
            .into_iter()
            .map(|id| {
                let state = run.state(&id).unwrap_or(TaskState::Pending);
                let output = outputs.get(id);
                let blocked_by = if state == TaskState::Pending {
                    run.blocked_by(&self.graph, &id)
                } else {
                    Vec::new()
                };
                TaskReport {
                    task: id,
                    state,
                    rows: output.map(TaskOutput::rows),
                    exclusions: output.and_then(TaskOutput::exclusions),
                    error: errors.remove(&id),
                    blocked_by,
                }
            })
            .collect();

        for task in tasks.iter().filter(|t| t.state == TaskState::Pending) {
            let blocked_by: Vec<&str> = task.blocked_by.iter().map(|id| id.name()).collect();
            warn!(task = %task.task, blocked_by = ?blocked_by, cancelled, "task did not run");
        }

        let report = RunReport { tasks, cancelled };
        info!(
            success = report.is_success(),
            failed = report.failed().count(),
            "pipeline run finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod tests;
