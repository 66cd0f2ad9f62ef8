use std::collections::{BTreeMap, BTreeSet};

use crate::logs::LogStore;
use crate::store::ConfigStore;
use crate::tasks::TaskSet;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelStats {
    pub task_count: usize,
    pub correct_tasks: usize,
    pub durations: Vec<f64>,
    pub total_cost: f64,
    pub dates: BTreeSet<String>,
    pub filenames: Vec<String>,
}

impl ModelStats {
    pub fn accuracy(&self) -> f64 {
        if self.task_count == 0 {
            0.0
        } else {
            self.correct_tasks as f64 / self.task_count as f64
        }
    }

    pub fn total_duration(&self) -> f64 {
        self.durations.iter().sum()
    }

    pub fn cost_per_task(&self) -> f64 {
        if self.task_count == 0 {
            0.0
        } else {
            self.total_cost / self.task_count as f64
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Stats {
    /// Keyed by configuration display name
    pub models: BTreeMap<String, ModelStats>,
    pub total_cost: f64,
    pub log_count: usize,
}

impl Stats {
    /// Models by accuracy, best first; ties keep name order
    pub fn ranked(&self) -> Vec<(&str, &ModelStats)> {
        let mut ranked: Vec<_> = self.models.iter().map(|(k, v)| (k.as_str(), v)).collect();
        ranked.sort_by(|a, b| b.1.accuracy().total_cmp(&a.1.accuracy()));
        ranked
    }
}

/// Aggregate every benchmark log per model configuration
pub fn collect_stats(logs: &LogStore, configs: &ConfigStore) -> Stats {
    let mut stats = Stats::default();

    for (path, log) in logs.all_logs() {
        stats.log_count += 1;
        let name = configs.display_name_for_reference(&log.model);
        let model = stats.models.entry(name).or_default();

        let file_cost: f64 = log.tasks.iter().filter_map(|t| t.metadata.cost_usd).sum();
        model.task_count += log.tasks.len();
        model.correct_tasks += log.tasks.iter().filter(|t| t.is_correct).count();
        model.durations.extend(log.tasks.iter().map(|t| t.duration_seconds));
        model.total_cost += file_cost;
        model.dates.insert(log.date.clone());
        if let Some(file_name) = path.file_name() {
            model.filenames.push(file_name.to_string_lossy().into_owned());
        }

        stats.total_cost += file_cost;
    }

    stats
}

/// One task prompt across every model that attempted it
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskStats {
    pub reference: String,
    pub attempts: usize,
    pub successes: usize,
    pub total_duration: f64,
    pub total_cost: f64,
    /// Latest outcome per model display name
    pub results: BTreeMap<String, bool>,
}

impl TaskStats {
    pub fn success_rate(&self) -> f64 {
        per_attempt(self.successes as f64, self.attempts)
    }

    pub fn average_duration(&self) -> f64 {
        per_attempt(self.total_duration, self.attempts)
    }

    pub fn average_cost(&self) -> f64 {
        per_attempt(self.total_cost, self.attempts)
    }
}

fn per_attempt(total: f64, attempts: usize) -> f64 {
    if attempts == 0 { 0.0 } else { total / attempts as f64 }
}

#[derive(Clone, Debug, Default)]
pub struct TaskTable {
    /// Keyed by task prompt
    pub tasks: BTreeMap<String, TaskStats>,
    /// Model display names, best overall success rate first
    pub models: Vec<String>,
}

impl TaskTable {
    /// Tasks by success rate, easiest first; ties keep prompt order
    pub fn ranked(&self) -> Vec<(&str, &TaskStats)> {
        let mut ranked: Vec<_> = self.tasks.iter().map(|(k, v)| (k.as_str(), v)).collect();
        ranked.sort_by(|a, b| b.1.success_rate().total_cmp(&a.1.success_rate()));
        ranked
    }
}

/// Aggregate every benchmark log per task prompt. Reference answers come
/// from `task_set`; prompts it does not know get an empty reference.
pub fn collect_task_stats(logs: &LogStore, configs: &ConfigStore, task_set: &TaskSet) -> TaskTable {
    let references: BTreeMap<&str, &str> = task_set
        .tasks
        .iter()
        .map(|t| (t.prompt.as_str(), t.reference.as_str()))
        .collect();
    let mut table = TaskTable::default();
    let mut per_model: BTreeMap<String, (usize, usize)> = BTreeMap::new();

    for (_, log) in logs.all_logs() {
        let name = configs.display_name_for_reference(&log.model);
        for task in &log.tasks {
            let stats = table.tasks.entry(task.prompt.clone()).or_default();
            stats.reference = references.get(task.prompt.as_str()).unwrap_or(&"").to_string();
            stats.attempts += 1;
            stats.total_duration += task.duration_seconds;
            stats.total_cost += task.metadata.cost_usd.unwrap_or(0.0);
            if task.is_correct {
                stats.successes += 1;
            }
            stats.results.insert(name.clone(), task.is_correct);

            let (correct, total) = per_model.entry(name.clone()).or_default();
            *total += 1;
            if task.is_correct {
                *correct += 1;
            }
        }
    }

    let mut models: Vec<_> = per_model.into_iter().collect();
    models.sort_by(|(_, a), (_, b)| {
        let rate = |(correct, total): &(usize, usize)| per_attempt(*correct as f64, *total);
        rate(b).total_cmp(&rate(a))
    });
    table.models = models.into_iter().map(|(name, _)| name).collect();
    table
}
