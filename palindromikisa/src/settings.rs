use std::path::PathBuf;

use crate::logs::LogStore;
use crate::store::ConfigStore;

/// Where the benchmark keeps its files
#[derive(Clone, Debug, derive_builder::Builder)]
#[builder(setter(into))]
pub struct Settings {
    /// Directory of model configuration files
    #[builder(default = "PathBuf::from(\"models\")")]
    pub models_dir: PathBuf,

    /// Directory of per-day benchmark logs
    #[builder(default = "PathBuf::from(\"benchmark_logs\")")]
    pub logs_dir: PathBuf,

    /// Task definitions
    #[builder(default = "PathBuf::from(\"benchmark_tasks/basic_tasks.yaml\")")]
    pub tasks_file: PathBuf,
}

impl Settings {
    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::new(&self.models_dir)
    }

    pub fn log_store(&self) -> LogStore {
        LogStore::new(&self.logs_dir)
    }
}

impl Default for Settings {
    fn default() -> Self {
        SettingsBuilder::default().build().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.models_dir, PathBuf::from("models"));
        assert_eq!(settings.logs_dir, PathBuf::from("benchmark_logs"));
    }

    #[test]
    fn overrides() {
        let settings = SettingsBuilder::default()
            .models_dir("/tmp/m")
            .build()
            .unwrap();
        assert_eq!(settings.config_store().dir(), std::path::Path::new("/tmp/m"));
        assert_eq!(settings.log_store().dir(), std::path::Path::new("benchmark_logs"));
    }
}
