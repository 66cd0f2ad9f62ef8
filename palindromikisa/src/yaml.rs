use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};
use yaml_rust2::{YamlEmitter, YamlLoader};

pub use yaml_rust2::{Yaml, yaml::Hash};

pub fn from_str<T: DeserializeOwned>(s: &str) -> anyhow::Result<T> {
    serde_yaml2::from_str(s).map_err(|e| anyhow::anyhow!("invalid YAML: {e}"))
}

pub fn to_string<T: Serialize>(value: &T) -> anyhow::Result<String> {
    serde_yaml2::to_string(value).map_err(|e| anyhow::anyhow!("could not serialize YAML: {e}"))
}

pub fn read<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    from_str(&::std::fs::read_to_string(path)?)
}

pub fn write<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    ::std::fs::write(path, to_string(value)?)?;
    Ok(())
}

/// First document of `s` as a node tree, `Null` when there is none. Unlike
/// the serde path this keeps quoting: `'5'` is a string, `5` an integer.
pub fn load_document(s: &str) -> anyhow::Result<Yaml> {
    let mut docs = YamlLoader::load_from_str(s).map_err(|e| anyhow::anyhow!("invalid YAML: {e}"))?;
    if docs.is_empty() {
        Ok(Yaml::Null)
    } else {
        Ok(docs.swap_remove(0))
    }
}

/// Strings that would read back as another type are quoted
pub fn emit_document(doc: &Yaml) -> anyhow::Result<String> {
    let mut out = String::new();
    YamlEmitter::new(&mut out)
        .dump(doc)
        .map_err(|e| anyhow::anyhow!("could not serialize YAML: {e}"))?;
    out.push('\n');
    Ok(out)
}
