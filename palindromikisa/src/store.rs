//! File-backed store of model configurations.
//!
//! Every configuration lives in `{dir}/{base_filename}.yaml`. The filename is
//! derived from the model name and options, so finding a configuration is a
//! single lookup, and a run with equivalent options always lands in the same
//! file. The directory is re-scanned on every call; nothing is cached.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::ModelConfig;
use crate::error::StoreError;
use crate::options::{OptionSet, OptionValue};
use crate::yaml::{self, Yaml};

/// On-disk shape of a configuration. Everything is optional so that a
/// nameless record can be told apart from one that does not parse.
#[derive(Debug, Default)]
struct ConfigRecord {
    name: Option<String>,
    options: Option<OptionSet>,
    skip: Option<bool>,
}

impl ConfigRecord {
    /// Records are read from the YAML node tree rather than through serde so
    /// that a quoted `'5'` stays a string option and `1.0` stays a float.
    fn from_yaml(doc: &Yaml) -> Result<Self, String> {
        let Some(fields) = doc.as_hash() else {
            return Err("expected a mapping at the top level".into());
        };

        let mut record = ConfigRecord::default();
        for (key, value) in fields {
            match key.as_str() {
                Some("name") => {
                    record.name = match value {
                        Yaml::Null => None,
                        Yaml::String(s) | Yaml::Real(s) => Some(s.clone()),
                        Yaml::Integer(i) => Some(i.to_string()),
                        _ => return Err("'name' must be a string".into()),
                    }
                }
                Some("options") => {
                    record.options = match value {
                        Yaml::Null => None,
                        Yaml::Hash(entries) => Some(parse_options(entries)?),
                        _ => return Err("'options' must be a mapping".into()),
                    }
                }
                Some("skip") => {
                    record.skip = match value {
                        Yaml::Null => None,
                        Yaml::Boolean(b) => Some(*b),
                        _ => return Err("'skip' must be true or false".into()),
                    }
                }
                _ => {}
            }
        }
        Ok(record)
    }

    fn into_config(self) -> Option<ModelConfig> {
        let name = self.name.filter(|n| !n.is_empty())?;
        Some(ModelConfig {
            name,
            options: self.options.unwrap_or_default(),
            skip: self.skip.unwrap_or_default(),
        })
    }
}

fn parse_options(entries: &yaml::Hash) -> Result<OptionSet, String> {
    entries
        .iter()
        .map(|(key, value)| {
            let name = key
                .as_str()
                .ok_or_else(|| format!("option name {key:?} is not a string"))?;
            let value = OptionValue::from_yaml(value)
                .ok_or_else(|| format!("option '{name}' has no scalar value"))?;
            Ok((name.to_string(), value))
        })
        .collect()
}

/// `name`, then `options` when there are any, then `skip` when set
fn config_document(config: &ModelConfig) -> Yaml {
    let mut doc = yaml::Hash::new();
    doc.insert(Yaml::String("name".into()), Yaml::String(config.name.clone()));
    if !config.options.is_empty() {
        let options = config
            .options
            .iter()
            .map(|(k, v)| (Yaml::String(k.to_string()), v.to_yaml()))
            .collect();
        doc.insert(Yaml::String("options".into()), Yaml::Hash(options));
    }
    if config.skip {
        doc.insert(Yaml::String("skip".into()), Yaml::Boolean(true));
    }
    Yaml::Hash(doc)
}

/// Serialized record for `config`, checked to read back as the same
/// configuration
fn encode_config(config: &ModelConfig) -> Result<String, String> {
    let text = yaml::emit_document(&config_document(config)).map_err(|e| e.to_string())?;
    let back = yaml::load_document(&text)
        .map_err(|e| e.to_string())
        .and_then(|doc| ConfigRecord::from_yaml(&doc))?
        .into_config();
    match back {
        Some(back) if back.name == config.name && back.options.equivalent(&config.options) => Ok(text),
        _ => Err(format!("options {} cannot be stored faithfully", config.options)),
    }
}

#[derive(Clone, Debug)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, config: &ModelConfig) -> PathBuf {
        self.dir.join(format!("{}.yaml", config.base_filename()))
    }

    /// Path reference stored in benchmark logs, e.g. `models/gpt-4o-t03.yaml`
    pub fn reference_for(&self, config: &ModelConfig) -> String {
        let dir_name = self
            .dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "models".to_string());
        format!("{dir_name}/{}.yaml", config.base_filename())
    }

    /// Find the persisted configuration for `name` and `options`, creating it
    /// if it does not exist yet.
    ///
    /// Fails with [`StoreError::Conflict`] when the expected file describes a
    /// different configuration; the existing file is left untouched.
    pub fn find_or_create(&self, name: &str, options: &OptionSet) -> Result<ModelConfig, StoreError> {
        let requested = ModelConfig::new(name, options.clone());
        let path = self.path_for(&requested);

        if path.exists() {
            let found = read_record(&path)?
                .into_config()
                .ok_or_else(|| StoreError::Malformed {
                    path: path.clone(),
                    reason: "missing 'name' field".into(),
                })?;

            if found.name != requested.name || !found.options.equivalent(&requested.options) {
                return Err(StoreError::Conflict {
                    path,
                    expected_name: requested.name,
                    expected: requested.options,
                    found_name: found.name,
                    found: found.options,
                });
            }

            debug!("Using model configuration {}", path.display());
            return Ok(found);
        }

        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let text = encode_config(&requested).map_err(|reason| StoreError::Malformed {
            path: path.clone(),
            reason,
        })?;
        fs::write(&path, text).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        info!("Created model configuration {}", path.display());

        Ok(requested)
    }

    /// All persisted configurations, sorted by filename. Unreadable or
    /// nameless records are skipped with a warning.
    pub fn list_all(&self, include_skipped: bool) -> Vec<ModelConfig> {
        if !self.dir.exists() {
            warn!("Models directory '{}' not found", self.dir.display());
            return vec![];
        }

        let files = match yaml_files(&self.dir) {
            Ok(files) => files,
            Err(e) => {
                warn!("Could not list {}: {e}", self.dir.display());
                return vec![];
            }
        };

        let configs: Vec<ModelConfig> = files
            .iter()
            .filter_map(|path| match read_record(path) {
                Ok(record) => match record.into_config() {
                    Some(config) => Some(config),
                    None => {
                        warn!("No 'name' field found in {}", path.display());
                        None
                    }
                },
                Err(e) => {
                    warn!("{e}");
                    None
                }
            })
            .filter(|config| include_skipped || !config.skip)
            .collect();

        if files.is_empty() {
            warn!("No model configuration files found in {}", self.dir.display());
        }
        configs
    }

    /// Resolve a path reference from a benchmark log. Only the file name is
    /// used; it is looked up in this store's directory.
    pub fn load_by_reference(&self, reference: &str) -> Option<ModelConfig> {
        let file_name = Path::new(reference).file_name()?;
        let path = self.dir.join(file_name);
        if !path.is_file() {
            return None;
        }
        read_record(&path).ok()?.into_config()
    }

    /// Display name of the referenced configuration, or the reference itself
    /// without its directory and extension when it cannot be loaded
    pub fn display_name_for_reference(&self, reference: &str) -> String {
        match self.load_by_reference(reference) {
            Some(config) => config.display_name(),
            None => fallback_display_name(reference),
        }
    }
}

fn fallback_display_name(reference: &str) -> String {
    let name = reference.rsplit('/').next().unwrap_or(reference);
    name.strip_suffix(".yaml").unwrap_or(name).to_string()
}

fn read_record(path: &Path) -> Result<ConfigRecord, StoreError> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    yaml::load_document(&content)
        .map_err(|e| e.to_string())
        .and_then(|doc| ConfigRecord::from_yaml(&doc))
        .map_err(|reason| StoreError::Malformed {
            path: path.to_path_buf(),
            reason,
        })
}

/// `*.yaml` files directly inside `dir`, sorted by name
pub(crate) fn yaml_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = vec![];
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "yaml") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
