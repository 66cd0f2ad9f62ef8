use palindromikisa::{
    OptionSet, Settings,
    benchmark::{BenchmarkRunner, resolve_configs},
    generate::connect,
    pricing::PricingCache,
    tasks::TaskSet,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

#[derive(clap::Args, Debug, serde::Serialize)]
pub struct BenchmarkArgs {
    /// Model to benchmark (repeatable); ALL runs every configured model
    #[arg(
        short = 'm',
        long = "model",
        default_value = "gemini/gemini-2.0-flash",
        env = "BENCH_MODEL"
    )]
    pub models: Vec<String>,

    /// Option passed to the model, e.g. `-o temperature 0.3` (repeatable)
    #[arg(short = 'o', long = "option", num_args = 2, value_names = ["NAME", "VALUE"])]
    pub options: Vec<String>,

    /// Maximum number of tasks to run per model
    #[arg(short, long, env = "BENCH_LIMIT")]
    pub limit: Option<usize>,
}

impl BenchmarkArgs {
    pub fn option_set(&self) -> OptionSet {
        OptionSet::from_pairs(
            self.options
                .chunks_exact(2)
                .map(|pair| (pair[0].as_str(), pair[1].as_str())),
        )
    }
}

pub fn run(settings: &Settings, args: BenchmarkArgs) -> anyhow::Result<()> {
    let tasks = TaskSet::load(&settings.tasks_file)?;
    let configs = settings.config_store();
    let logs = settings.log_store();
    let pricing = PricingCache::new(PricingCache::default_path());
    let runner = BenchmarkRunner {
        configs: &configs,
        logs: &logs,
        tasks: &tasks,
        pricing: &pricing,
    };

    let resolved = resolve_configs(&configs, &args.models, &args.option_set());
    if resolved.is_empty() {
        warn!("No models to benchmark");
        return Ok(());
    }

    let mut failures = 0;
    for (requested, config) in resolved {
        eprintln!("\n{}", "=".repeat(60));
        eprintln!("Running benchmark for model: {requested}");
        eprintln!("{}", "=".repeat(60));

        let config = match config {
            Ok(config) => config,
            Err(e) => {
                error!("{e:#}");
                failures += 1;
                continue;
            }
        };

        let pending = runner.pending_count(&config, args.limit);
        if pending == 0 {
            info!("All tasks have already been completed for {}", config.display_name());
            continue;
        }

        let model = match connect(&config) {
            Ok(model) => model,
            Err(e) => {
                error!("Skipping '{}': {e:#}", config.name);
                failures += 1;
                continue;
            }
        };

        let pb = progress_bar(pending as u64, config.display_name());
        let mut correct = 0;
        let result = runner.run_model(model.as_ref(), &config, args.limit, |record| {
            if record.is_correct {
                correct += 1;
            }
            pb.set_message(format!(
                "{} \x1b[1m|\x1b[0m {correct}/{} correct \x1b[1m|\x1b[0m {:.2}s",
                config.display_name(),
                pb.position() + 1,
                record.duration_seconds
            ));
            pb.inc(1);
        });

        match result {
            Ok(summary) => {
                pb.finish_with_message(format!("✓ {}", config.display_name()));
                eprintln!(
                    "New tasks score: {}/{} correct ({:.1}%)",
                    summary.new_correct,
                    summary.new_total,
                    summary.new_score() * 100.0
                );
                eprintln!(
                    "Overall score: {}/{} correct ({:.1}%)",
                    summary.overall_correct,
                    summary.overall_total,
                    summary.overall_score() * 100.0
                );
            }
            Err(e) => {
                pb.finish_with_message(format!("✗ {}", config.display_name()));
                error!("Benchmark of '{}' stopped: {e:#}", config.display_name());
                failures += 1;
            }
        }
    }

    if failures > 0 {
        Err(anyhow::anyhow!("{failures} model(s) failed"))
    } else {
        Ok(())
    }
}

fn progress_bar(total: u64, message: String) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar().template("[{elapsed_precise}] [{pos}/{len}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::args::{Commands, FullArgs};
    use clap::Parser;
    use palindromikisa::OptionValue;

    fn benchmark_args(argv: &[&str]) -> BenchmarkArgs {
        match FullArgs::try_parse_from(argv).unwrap().command {
            Commands::Benchmark(b) => b,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parse_benchmark_defaults() {
        let b = benchmark_args(&["palindromikisa", "benchmark"]);
        assert_eq!(b.models, vec!["gemini/gemini-2.0-flash"]);
        assert!(b.option_set().is_empty());
        assert_eq!(b.limit, None);
    }

    #[test]
    fn parse_benchmark_models_and_options() {
        let b = benchmark_args(&[
            "palindromikisa",
            "benchmark",
            "-m",
            "openrouter/x-ai/grok-4",
            "-m",
            "gpt-4o-mini",
            "-o",
            "temperature",
            "0.3",
            "--option",
            "top_k",
            "40",
            "-l",
            "5",
        ]);
        assert_eq!(b.models, vec!["openrouter/x-ai/grok-4", "gpt-4o-mini"]);
        assert_eq!(b.limit, Some(5));

        let options = b.option_set();
        assert_eq!(options.len(), 2);
        assert!(matches!(options.get("top_k"), Some(OptionValue::Int(40))));
        assert_eq!(palindromikisa::generate_suffix(&options), "-t03-tk40");
    }

    #[test]
    fn option_needs_a_value() {
        assert!(FullArgs::try_parse_from(["palindromikisa", "benchmark", "-o", "temperature"]).is_err());
    }

    #[test]
    fn global_directories() {
        let args = FullArgs::try_parse_from([
            "palindromikisa",
            "stats",
            "--models-dir",
            "/tmp/models",
        ])
        .unwrap();
        let settings = args.settings().unwrap();
        assert_eq!(settings.models_dir, std::path::PathBuf::from("/tmp/models"));
    }

    #[test]
    fn parse_tasks_command() {
        let args = FullArgs::try_parse_from(["palindromikisa", "tasks", "--logs-dir", "/tmp/logs"]).unwrap();
        assert!(matches!(args.command, Commands::Tasks));
        assert_eq!(args.logs_dir, std::path::PathBuf::from("/tmp/logs"));
    }
}
