use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use super::{DagError, TaskState};

/// Directed acyclic graph of tasks. An edge `a -> b` means `a` must succeed
/// before `b` may start.
///
/// Nodes are kept in ordered sets so that every traversal, and therefore
/// every log line and report, comes out in the same order on every run.
#[derive(Debug, Clone)]
pub struct TaskGraph<K> {
    upstream: BTreeMap<K, BTreeSet<K>>,
    downstream: BTreeMap<K, BTreeSet<K>>,
}

impl<K> Default for TaskGraph<K> {
    fn default() -> Self {
        TaskGraph {
            upstream: BTreeMap::new(),
            downstream: BTreeMap::new(),
        }
    }
}

impl<K> TaskGraph<K>
where
    K: Copy + Ord + Display,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_task(&mut self, task: K) -> Result<(), DagError> {
        if self.upstream.contains_key(&task) {
            return Err(DagError::DuplicateNode(task.to_string()));
        }
        self.upstream.insert(task, BTreeSet::new());
        self.downstream.insert(task, BTreeSet::new());
        Ok(())
    }

    /// Declares that `before` must complete before `after` starts.
    pub fn add_dependency(&mut self, before: K, after: K) -> Result<(), DagError> {
        self.require(before)?;
        self.require(after)?;
        if before == after {
            return Err(DagError::Cycle(vec![before.to_string()]));
        }
        self.upstream.entry(after).or_default().insert(before);
        self.downstream.entry(before).or_default().insert(after);
        Ok(())
    }

    /// Declares that every task in `before` must complete before `after`.
    pub fn add_fan_in(&mut self, before: &[K], after: K) -> Result<(), DagError> {
        for task in before {
            self.add_dependency(*task, after)?;
        }
        Ok(())
    }

    pub fn contains(&self, task: &K) -> bool {
        self.upstream.contains_key(task)
    }

    pub fn len(&self) -> usize {
        self.upstream.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upstream.is_empty()
    }

    pub fn tasks(&self) -> impl Iterator<Item = K> + '_ {
        self.upstream.keys().copied()
    }

    pub fn dependencies(&self, task: &K) -> impl Iterator<Item = K> + '_ {
        self.upstream
            .get(task)
            .into_iter()
            .flat_map(|deps| deps.iter().copied())
    }

    pub fn dependents(&self, task: &K) -> impl Iterator<Item = K> + '_ {
        self.downstream
            .get(task)
            .into_iter()
            .flat_map(|deps| deps.iter().copied())
    }

    pub fn edges(&self) -> impl Iterator<Item = (K, K)> + '_ {
        self.downstream
            .iter()
            .flat_map(|(before, afters)| afters.iter().map(move |after| (*before, *after)))
    }

    /// Kahn's algorithm; ties are broken by key order.
    pub fn topological_order(&self) -> Result<Vec<K>, DagError> {
        let mut in_degree: BTreeMap<K, usize> = self
            .upstream
            .iter()
            .map(|(task, deps)| (*task, deps.len()))
            .collect();
        let mut ready: BTreeSet<K> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(task, _)| *task)
            .collect();

        let mut order = Vec::with_capacity(self.upstream.len());
        while let Some(task) = ready.pop_first() {
            order.push(task);
            for next in self.dependents(&task) {
                if let Some(degree) = in_degree.get_mut(&next) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(next);
                    }
                }
            }
        }

        if order.len() != self.upstream.len() {
            let stuck = in_degree
                .into_iter()
                .filter(|(_, degree)| *degree > 0)
                .map(|(task, _)| task.to_string())
                .collect();
            return Err(DagError::Cycle(stuck));
        }
        Ok(order)
    }

    fn require(&self, task: K) -> Result<(), DagError> {
        if self.contains(&task) {
            Ok(())
        } else {
            Err(DagError::UnknownNode(task.to_string()))
        }
    }
}

/// Per-run task states layered over a [`TaskGraph`].
#[derive(Debug, Clone)]
pub struct GraphRun<K> {
    states: BTreeMap<K, TaskState>,
}

impl<K> GraphRun<K>
where
    K: Copy + Ord + Display,
{
    pub fn new(graph: &TaskGraph<K>) -> Self {
        GraphRun {
            states: graph.tasks().map(|task| (task, TaskState::Pending)).collect(),
        }
    }

    pub fn state(&self, task: &K) -> Option<TaskState> {
        self.states.get(task).copied()
    }

    pub fn states(&self) -> impl Iterator<Item = (K, TaskState)> + '_ {
        self.states.iter().map(|(task, state)| (*task, *state))
    }

    pub fn transition(&mut self, task: K, next: TaskState) -> Result<(), DagError> {
        let current = self
            .states
            .get_mut(&task)
            .ok_or_else(|| DagError::UnknownNode(task.to_string()))?;
        if !current.can_transition_to(next) {
            return Err(DagError::InvalidTransition {
                task: task.to_string(),
                from: *current,
                to: next,
            });
        }
        *current = next;
        Ok(())
    }

    /// Pending tasks whose upstream tasks have all succeeded.
    pub fn ready(&self, graph: &TaskGraph<K>) -> Vec<K> {
        self.states
            .iter()
            .filter(|(_, state)| **state == TaskState::Pending)
            .filter(|(task, _)| {
                graph
                    .dependencies(task)
                    .all(|dep| self.state(&dep) == Some(TaskState::Succeeded))
            })
            .map(|(task, _)| *task)
            .collect()
    }

    /// Upstream tasks that have not succeeded and therefore hold `task` back.
    pub fn blocked_by(&self, graph: &TaskGraph<K>, task: &K) -> Vec<K> {
        graph
            .dependencies(task)
            .filter(|dep| self.state(dep) != Some(TaskState::Succeeded))
            .collect()
    }

    pub fn any_running(&self) -> bool {
        self.states.values().any(|state| *state == TaskState::Running)
    }

    pub fn all_succeeded(&self) -> bool {
        self.states.values().all(|state| *state == TaskState::Succeeded)
    }
}
