use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::dag::DagError;
use crate::transform::{DimensionKeys, ExclusionCounts, KeyMap};

/// The five entry points of the rental warehouse graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskId {
    Date,
    Film,
    Store,
    Customer,
    Rental,
}

impl TaskId {
    pub const ALL: [TaskId; 5] = [
        TaskId::Date,
        TaskId::Film,
        TaskId::Store,
        TaskId::Customer,
        TaskId::Rental,
    ];

    pub const DIMENSIONS: [TaskId; 4] = [TaskId::Date, TaskId::Film, TaskId::Store, TaskId::Customer];

    pub fn name(self) -> &'static str {
        match self {
            TaskId::Date => "run_date_etl",
            TaskId::Film => "run_film_etl",
            TaskId::Store => "run_store_etl",
            TaskId::Customer => "run_customer_etl",
            TaskId::Rental => "run_rental_etl",
        }
    }

    fn short_name(self) -> &'static str {
        match self {
            TaskId::Date => "date",
            TaskId::Film => "film",
            TaskId::Store => "store",
            TaskId::Customer => "customer",
            TaskId::Rental => "rental",
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts either the full task name (`run_film_etl`) or its short form (`film`).
impl FromStr for TaskId {
    type Err = DagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        TaskId::ALL
            .into_iter()
            .find(|id| id.name() == wanted || id.short_name() == wanted)
            .ok_or_else(|| DagError::UnknownNode(s.to_string()))
    }
}

impl Serialize for TaskId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// What a finished task hands to its downstream tasks.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutput {
    Dates(KeyMap<NaiveDate>),
    Films(KeyMap<i64>),
    Stores(KeyMap<i64>),
    Customers(KeyMap<i64>),
    Rentals {
        rows: usize,
        exclusions: ExclusionCounts,
    },
}

impl TaskOutput {
    /// Rows written to the task's table.
    pub fn rows(&self) -> usize {
        match self {
            TaskOutput::Dates(keys) => keys.len(),
            TaskOutput::Films(keys) | TaskOutput::Stores(keys) | TaskOutput::Customers(keys) => {
                keys.len()
            }
            TaskOutput::Rentals { rows, .. } => *rows,
        }
    }

    pub fn exclusions(&self) -> Option<ExclusionCounts> {
        match self {
            TaskOutput::Rentals { exclusions, .. } => Some(*exclusions),
            _ => None,
        }
    }
}

/// Outputs of the upstream tasks that already succeeded in this run.
#[derive(Debug, Clone, Default)]
pub struct Upstream {
    outputs: BTreeMap<TaskId, TaskOutput>,
}

impl Upstream {
    pub fn insert(&mut self, task: TaskId, output: TaskOutput) {
        self.outputs.insert(task, output);
    }

    pub fn get(&self, task: TaskId) -> Option<&TaskOutput> {
        self.outputs.get(&task)
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Copies the outputs of `tasks` into a new, smaller set.
    pub fn subset<I>(&self, tasks: I) -> Upstream
    where
        I: IntoIterator<Item = TaskId>,
    {
        let outputs = tasks
            .into_iter()
            .filter_map(|task| self.outputs.get(&task).map(|out| (task, out.clone())))
            .collect();
        Upstream { outputs }
    }

    /// All four dimension key maps, if every dimension task ran in-process.
    pub fn dimension_keys(&self) -> Option<DimensionKeys> {
        let dates = match self.get(TaskId::Date)? {
            TaskOutput::Dates(keys) => keys.clone(),
            _ => return None,
        };
        let films = match self.get(TaskId::Film)? {
            TaskOutput::Films(keys) => keys.clone(),
            _ => return None,
        };
        let stores = match self.get(TaskId::Store)? {
            TaskOutput::Stores(keys) => keys.clone(),
            _ => return None,
        };
        let customers = match self.get(TaskId::Customer)? {
            TaskOutput::Customers(keys) => keys.clone(),
            _ => return None,
        };
        Some(DimensionKeys {
            dates,
            films,
            stores,
            customers,
        })
    }
}
