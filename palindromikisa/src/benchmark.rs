use std::time::Instant;

use tracing::{info, warn};

use crate::config::ModelConfig;
use crate::generate::Model;
use crate::logs::{LogStore, TaskMetadata, TaskRecord, completed_prompts};
use crate::options::OptionSet;
use crate::pricing::CostLookup;
use crate::scoring::{extract_palindrome, is_correct};
use crate::store::ConfigStore;
use crate::tasks::TaskSet;

/// Model name that selects every configured model
pub const ALL_MODELS: &str = "ALL";

/// Configurations to benchmark for the requested model names. `ALL` expands
/// to every configuration not marked `skip` (its options are taken from the
/// files, not from `options`). Each entry carries its own result, so one
/// conflicting configuration does not stop the others.
pub fn resolve_configs(
    store: &ConfigStore,
    models: &[String],
    options: &OptionSet,
) -> Vec<(String, anyhow::Result<ModelConfig>)> {
    if models.iter().any(|m| m == ALL_MODELS) {
        let configs = store.list_all(false);
        info!("Found {} configured models", configs.len());
        return configs
            .into_iter()
            .map(|c| (c.display_name(), Ok(c)))
            .collect();
    }

    models
        .iter()
        .map(|name| {
            let config = store.find_or_create(name, options).map_err(anyhow::Error::from);
            (name.clone(), config)
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub new_correct: usize,
    pub new_total: usize,
    pub overall_correct: usize,
    pub overall_total: usize,
}

impl RunSummary {
    pub fn new_score(&self) -> f64 {
        ratio(self.new_correct, self.new_total)
    }

    pub fn overall_score(&self) -> f64 {
        ratio(self.overall_correct, self.overall_total)
    }
}

fn ratio(n: usize, d: usize) -> f64 {
    if d == 0 { 0.0 } else { n as f64 / d as f64 }
}

pub struct BenchmarkRunner<'a> {
    pub configs: &'a ConfigStore,
    pub logs: &'a LogStore,
    pub tasks: &'a TaskSet,
    pub pricing: &'a dyn CostLookup,
}

impl BenchmarkRunner<'_> {
    /// Number of tasks still to run for `config`, after `limit`
    pub fn pending_count(&self, config: &ModelConfig, limit: Option<usize>) -> usize {
        let existing = self
            .logs
            .existing_logs(self.configs, config, &self.tasks.system_prompt);
        let done = completed_prompts(&existing);
        let pending = self
            .tasks
            .tasks
            .iter()
            .filter(|t| !done.contains(&t.prompt))
            .count();
        limit.map_or(pending, |l| pending.min(l))
    }

    /// Run the tasks `config` has not completed yet, saving every result as
    /// soon as it is scored. `on_task` sees each saved record.
    pub fn run_model(
        &self,
        model: &dyn Model,
        config: &ModelConfig,
        limit: Option<usize>,
        mut on_task: impl FnMut(&TaskRecord),
    ) -> anyhow::Result<RunSummary> {
        let existing = self
            .logs
            .existing_logs(self.configs, config, &self.tasks.system_prompt);
        let done = completed_prompts(&existing);
        let previous_correct = existing
            .iter()
            .flat_map(|log| &log.tasks)
            .filter(|t| t.is_correct)
            .count();

        info!(
            "Found {} existing log files for {}, {} tasks already completed",
            existing.len(),
            config.display_name(),
            done.len()
        );

        let pending: Vec<_> = self
            .tasks
            .tasks
            .iter()
            .filter(|t| !done.contains(&t.prompt))
            .take(limit.unwrap_or(usize::MAX))
            .collect();

        let mut summary = RunSummary {
            overall_correct: previous_correct,
            overall_total: done.len(),
            ..Default::default()
        };

        for task in pending {
            let started = Instant::now();
            let response = model.prompt(&self.tasks.render_prompt(task))?;
            let duration = started.elapsed().as_secs_f64();

            let answer = extract_palindrome(&response.text).to_lowercase();
            let correct = is_correct(&answer, &task.reference);

            let mut metadata = TaskMetadata {
                input_tokens: response.input_tokens,
                output_tokens: response.output_tokens,
                ..Default::default()
            };
            match self.pricing.cost(
                model.name(),
                response.input_tokens.unwrap_or(0),
                response.output_tokens.unwrap_or(0),
                &response.metadata,
            ) {
                Some((cost, source)) => {
                    metadata.cost_usd = Some(cost);
                    metadata.cost_source = Some(source.to_string());
                }
                None => warn!("No pricing found for {}", model.name()),
            }

            let record = TaskRecord {
                timestamp: chrono::Local::now().to_rfc3339(),
                prompt: task.prompt.clone(),
                answer,
                is_correct: correct,
                duration_seconds: (duration * 100.0).round() / 100.0,
                metadata,
            };
            let today = chrono::Local::now().format("%Y-%m-%d").to_string();
            self.logs.append_task(
                self.configs,
                config,
                &self.tasks.system_prompt,
                record.clone(),
                &today,
            )?;

            summary.new_total += 1;
            summary.overall_total += 1;
            if correct {
                summary.new_correct += 1;
                summary.overall_correct += 1;
            }
            on_task(&record);
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::ModelResponse;
    use crate::pricing::CostSource;
    use crate::tasks::Task;
    use std::cell::RefCell;

    /// Answers from a fixed list, in order
    struct ScriptedModel {
        answers: RefCell<Vec<&'static str>>,
        prompts: RefCell<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(answers: &[&'static str]) -> Self {
            let mut answers = answers.to_vec();
            answers.reverse();
            Self {
                answers: RefCell::new(answers),
                prompts: RefCell::new(vec![]),
            }
        }
    }

    impl Model for ScriptedModel {
        fn name(&self) -> &str {
            "scripted/model"
        }

        fn prompt(&self, text: &str) -> anyhow::Result<ModelResponse> {
            self.prompts.borrow_mut().push(text.to_string());
            let answer = self
                .answers
                .borrow_mut()
                .pop()
                .ok_or_else(|| anyhow::anyhow!("out of answers"))?;
            Ok(ModelResponse {
                text: format!("<PALINDROMI>{answer}</PALINDROMI>"),
                input_tokens: Some(10),
                output_tokens: Some(5),
                metadata: serde_json::json!({}),
            })
        }
    }

    struct FlatRate;

    impl CostLookup for FlatRate {
        fn cost(&self, _: &str, input: u64, output: u64, _: &serde_json::Value) -> Option<(f64, CostSource)> {
            Some(((input + output) as f64 * 0.001, CostSource::LiteLlm))
        }
    }

    fn tasks() -> TaskSet {
        TaskSet {
            system_prompt: "Kirjoita palindromi: {prompt}".into(),
            tasks: vec![
                Task {
                    prompt: "saippuan myyjä".into(),
                    reference: "saippuakauppias".into(),
                },
                Task {
                    prompt: "innokas härkä".into(),
                    reference: "Innostunut sonni".into(),
                },
                Task {
                    prompt: "kivisaippuan myyjä".into(),
                    reference: "saippuakivikauppias".into(),
                },
            ],
        }
    }

    #[test]
    fn runs_scores_and_resumes() {
        let dir = tempfile::tempdir().unwrap();
        let configs = ConfigStore::new(dir.path().join("models"));
        let logs = LogStore::new(dir.path().join("benchmark_logs"));
        let tasks = tasks();
        let runner = BenchmarkRunner {
            configs: &configs,
            logs: &logs,
            tasks: &tasks,
            pricing: &FlatRate,
        };
        let config = configs
            .find_or_create("scripted/model", &OptionSet::new().with("temperature", 0.3))
            .unwrap();

        let model = ScriptedModel::new(&["Saippuakauppias", "innostunut sonni!"]);
        let mut seen = vec![];
        let summary = runner
            .run_model(&model, &config, Some(2), |r| seen.push(r.prompt.clone()))
            .unwrap();
        assert_eq!(summary.new_total, 2);
        assert_eq!(summary.new_correct, 2);
        assert_eq!(seen, vec!["saippuan myyjä", "innokas härkä"]);
        assert_eq!(model.prompts.borrow()[0], "Kirjoita palindromi: saippuan myyjä");
        assert_eq!(runner.pending_count(&config, None), 1);

        let model = ScriptedModel::new(&["väärin"]);
        let summary = runner.run_model(&model, &config, None, |_| {}).unwrap();
        assert_eq!(
            summary,
            RunSummary {
                new_correct: 0,
                new_total: 1,
                overall_correct: 2,
                overall_total: 3,
            }
        );
        assert_eq!(model.prompts.borrow().len(), 1);
        assert_eq!(runner.pending_count(&config, None), 0);

        let saved = logs.all_logs();
        assert_eq!(saved.len(), 1);
        let record = &saved[0].1.tasks[0];
        assert_eq!(record.answer, "saippuakauppias");
        assert_eq!(record.metadata.input_tokens, Some(10));
        assert_eq!(record.metadata.cost_source.as_deref(), Some("litellm"));
    }

    #[test]
    fn failing_model_keeps_saved_results() {
        let dir = tempfile::tempdir().unwrap();
        let configs = ConfigStore::new(dir.path().join("models"));
        let logs = LogStore::new(dir.path().join("benchmark_logs"));
        let tasks = tasks();
        let runner = BenchmarkRunner {
            configs: &configs,
            logs: &logs,
            tasks: &tasks,
            pricing: &FlatRate,
        };
        let config = configs.find_or_create("scripted/model", &OptionSet::new()).unwrap();

        let model = ScriptedModel::new(&["saippuakauppias"]);
        assert!(runner.run_model(&model, &config, None, |_| {}).is_err());
        assert_eq!(runner.pending_count(&config, None), 2);
    }

    #[test]
    fn resolve_all_uses_unskipped_configs() {
        let dir = tempfile::tempdir().unwrap();
        let configs = ConfigStore::new(dir.path());
        ::std::fs::write(dir.path().join("a.yaml"), "name: a\n").unwrap();
        ::std::fs::write(dir.path().join("b.yaml"), "name: b\nskip: true\n").unwrap();

        let resolved = resolve_configs(&configs, &["ALL".to_string()], &OptionSet::new());
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].0, "a");
    }

    #[test]
    fn resolve_reports_conflicts_per_model() {
        let dir = tempfile::tempdir().unwrap();
        let configs = ConfigStore::new(dir.path());
        ::std::fs::write(
            dir.path().join("a-t03.yaml"),
            "name: a\noptions:\n  temperature: '03'\n",
        )
        .unwrap();

        let options = OptionSet::new().with("temperature", 0.3);
        let resolved = resolve_configs(&configs, &["a".to_string(), "b".to_string()], &options);
        let err = resolved[0].1.as_ref().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::StoreError>(),
            Some(crate::StoreError::Conflict { .. })
        ));
        assert!(resolved[1].1.is_ok());
    }
}
