use clap::{Parser, Subcommand};
use palindromikisa::{Settings, SettingsBuilder};
use std::path::PathBuf;

use crate::bench::BenchmarkArgs;

#[derive(Parser, Debug)]
#[command(version, about = "Benchmark LLMs on Finnish palindrome generation", long_about = None)]
pub struct FullArgs {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory of model configuration files
    #[arg(long, global = true, default_value = "models", env = "PALINDROMIKISA_MODELS_DIR")]
    pub models_dir: PathBuf,

    /// Directory of benchmark logs
    #[arg(long, global = true, default_value = "benchmark_logs", env = "PALINDROMIKISA_LOGS_DIR")]
    pub logs_dir: PathBuf,

    /// Benchmark task file
    #[arg(
        long,
        global = true,
        default_value = "benchmark_tasks/basic_tasks.yaml",
        env = "PALINDROMIKISA_TASKS_FILE"
    )]
    pub tasks_file: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl FullArgs {
    pub fn settings(&self) -> anyhow::Result<Settings> {
        Ok(SettingsBuilder::default()
            .models_dir(self.models_dir.clone())
            .logs_dir(self.logs_dir.clone())
            .tasks_file(self.tasks_file.clone())
            .build()?)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run palindrome benchmark tasks
    Benchmark(BenchmarkArgs),

    /// Display statistics aggregated from benchmark logs
    Stats,

    /// Display per-task success across all models
    Tasks,

    /// List configured models
    Models {
        /// Include configurations marked `skip`
        #[arg(short, long)]
        all: bool,
    },

    /// Download the latest model price table
    UpdatePricing,
}
