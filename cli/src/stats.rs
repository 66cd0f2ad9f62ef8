use palindromikisa::{Settings, stats::collect_stats};

pub fn run(settings: &Settings) -> anyhow::Result<()> {
    let stats = collect_stats(&settings.log_store(), &settings.config_store());

    println!("AI Palindromikisa - Model Statistics");
    println!("{}", "=".repeat(50));

    if stats.models.is_empty() {
        println!("No benchmark logs found in {}", settings.logs_dir.display());
        return Ok(());
    }

    println!(
        "Found {} benchmark log files for {} unique models",
        stats.log_count,
        stats.models.len()
    );
    println!("{}", "-".repeat(50));
    println!("\nModels ranked by accuracy:\n");

    for (idx, (name, model)) in stats.ranked().into_iter().enumerate() {
        println!(
            "{:2}. {name}: {}/{} ({:.1}%) - ${:.4} total, ${:.6}/task",
            idx + 1,
            model.correct_tasks,
            model.task_count,
            model.accuracy() * 100.0,
            model.total_cost,
            model.cost_per_task()
        );
        let (min, p50, p90, max) = duration_spread(&model.durations);
        println!(
            "    Duration: {:.1}s total, min {min:.2}s, p50 {p50:.2}s, p90 {p90:.2}s, max {max:.2}s",
            model.total_duration()
        );
        println!(
            "    Dates: {}",
            model.dates.iter().cloned().collect::<Vec<_>>().join(", ")
        );
    }

    println!("\n{}", "-".repeat(50));
    println!("Total cost across all logged tasks: ${:.4}", stats.total_cost);
    Ok(())
}

/// Min, median, 90th percentile and max; zeros when there are no values
fn duration_spread(values: &[f64]) -> (f64, f64, f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0, 0.0, 0.0);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let at = |pct: usize| sorted[(sorted.len() * pct / 100).min(sorted.len() - 1)];
    (sorted[0], at(50), at(90), sorted[sorted.len() - 1])
}
