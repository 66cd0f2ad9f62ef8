use palindromikisa::{Settings, stats::collect_task_stats, tasks::TaskSet};

const MARKERS: &str = "123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub fn run(settings: &Settings) -> anyhow::Result<()> {
    let task_set = TaskSet::load(&settings.tasks_file)?;
    let table = collect_task_stats(&settings.log_store(), &settings.config_store(), &task_set);

    if table.tasks.is_empty() {
        println!("No task statistics found.");
        return Ok(());
    }

    // one marker per model, in legend order
    let markers: Vec<char> = MARKERS
        .chars()
        .chain(std::iter::repeat('+'))
        .take(table.models.len())
        .collect();
    let width = markers.len().max(6);

    println!("Task statistics (sorted by success %)\n");
    println!(
        "{:>4}  {:>7}  {:>7}  {:<width$}  {:<24}  Prompt",
        "%", "Time", "¢/Task", "Models", "Answer"
    );
    for (prompt, task) in table.ranked() {
        let success_map: String = table
            .models
            .iter()
            .zip(&markers)
            .map(|(model, marker)| match task.results.get(model) {
                Some(true) => *marker,
                _ => ' ',
            })
            .collect();
        println!(
            "{:>3.0}%  {:>6.1}s  {:>6.2}¢  {success_map:<width$}  {:<24}  {prompt}",
            task.success_rate() * 100.0,
            task.average_duration(),
            task.average_cost() * 100.0,
            task.reference,
        );
    }

    println!("\nModel legend\n");
    for (model, marker) in table.models.iter().zip(&markers) {
        println!("{marker:>3}  {model}");
    }
    Ok(())
}
