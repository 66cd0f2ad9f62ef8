//! Per-day benchmark logs.
//!
//! One file per configuration and day, `{date}-{base_filename}.yaml`. Each
//! task result is appended as soon as it is known, so an interrupted run can
//! be resumed by skipping the prompts already present.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::config::ModelConfig;
use crate::store::{ConfigStore, yaml_files};
use crate::yaml;

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TaskMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_source: Option<String>,
}

impl TaskMetadata {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// An empty `metadata:` entry reads back as null
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TaskRecord {
    #[serde(default)]
    pub timestamp: String,
    pub prompt: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "TaskMetadata::is_empty"
    )]
    pub metadata: TaskMetadata,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BenchmarkLog {
    pub date: String,
    /// Configuration reference, see [`ConfigStore::reference_for`]
    pub model: String,
    #[serde(default)]
    pub prompt_template: String,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
}

#[derive(Clone, Debug)]
pub struct LogStore {
    dir: PathBuf,
}

impl LogStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn log_path(&self, config: &ModelConfig, date: &str) -> PathBuf {
        self.dir.join(format!("{date}-{}.yaml", config.base_filename()))
    }

    pub fn load(&self, path: &Path) -> anyhow::Result<Option<BenchmarkLog>> {
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(yaml::read(path)?))
    }

    pub fn save(&self, path: &Path, log: &BenchmarkLog) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)?;
        yaml::write(path, log)
    }

    /// Append one task result to the configuration's log for `date`
    pub fn append_task(
        &self,
        configs: &ConfigStore,
        config: &ModelConfig,
        prompt_template: &str,
        record: TaskRecord,
        date: &str,
    ) -> anyhow::Result<PathBuf> {
        let path = self.log_path(config, date);
        let mut log = self.load(&path)?.unwrap_or_else(|| BenchmarkLog {
            date: date.to_string(),
            model: configs.reference_for(config),
            prompt_template: prompt_template.to_string(),
            tasks: vec![],
        });
        log.tasks.push(record);
        self.save(&path, &log)?;
        debug!("Task result saved to {}", path.display());
        Ok(path)
    }

    /// Every log, sorted by filename. Unreadable files are skipped.
    pub fn all_logs(&self) -> Vec<(PathBuf, BenchmarkLog)> {
        if !self.dir.exists() {
            return vec![];
        }
        let files = match yaml_files(&self.dir) {
            Ok(files) => files,
            Err(e) => {
                warn!("Could not list {}: {e}", self.dir.display());
                return vec![];
            }
        };
        files
            .into_iter()
            .filter_map(|path| match yaml::read::<BenchmarkLog>(&path) {
                Ok(log) => Some((path, log)),
                Err(e) => {
                    warn!("Could not read log file {}: {e}", path.display());
                    None
                }
            })
            .collect()
    }

    /// Logs of `config` that were run with the given system prompt
    pub fn existing_logs(
        &self,
        configs: &ConfigStore,
        config: &ModelConfig,
        system_prompt: &str,
    ) -> Vec<BenchmarkLog> {
        let reference = configs.reference_for(config);
        let system_prompt = system_prompt.trim();
        self.all_logs()
            .into_iter()
            .map(|(_, log)| log)
            .filter(|log| log.model == reference)
            .filter(|log| log.prompt_template.trim().starts_with(system_prompt))
            .collect()
    }
}

pub fn completed_prompts(logs: &[BenchmarkLog]) -> BTreeSet<String> {
    logs.iter()
        .flat_map(|log| log.tasks.iter().map(|t| t.prompt.clone()))
        .collect()
}
