use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod args;
mod bench;
mod models;
mod stats;
mod tasks;

use args::{Commands, FullArgs};
use palindromikisa::pricing::PricingCache;

fn main() -> anyhow::Result<()> {
    let args = FullArgs::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(::std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let settings = args.settings()?;

    match args.command {
        Commands::Benchmark(bench_args) => bench::run(&settings, bench_args),
        Commands::Stats => stats::run(&settings),
        Commands::Tasks => tasks::run(&settings),
        Commands::Models { all } => models::run(&settings, all),
        Commands::UpdatePricing => {
            let mut cache = PricingCache::new(PricingCache::default_path());
            let count = cache.refresh()?;
            println!("Saved pricing for {count} models to {}", cache.path().display());
            Ok(())
        }
    }
}
