use palindromikisa::Settings;

pub fn run(settings: &Settings, include_skipped: bool) -> anyhow::Result<()> {
    let store = settings.config_store();
    let configs = store.list_all(include_skipped);

    for config in &configs {
        let skipped = if config.skip { " (skip)" } else { "" };
        println!(
            "{}{skipped}\n    {}",
            config.display_name(),
            store.path_for(config).display()
        );
    }
    if configs.is_empty() {
        println!("No model configurations in {}", store.dir().display());
    }
    Ok(())
}
