use crate::options::OptionSet;
use crate::suffix::generate_suffix;

/// A model together with the options it is invoked with
#[derive(Clone, Debug, PartialEq, derive_builder::Builder)]
#[builder(setter(into))]
pub struct ModelConfig {
    /// Model name as the provider knows it, e.g. `openrouter/x-ai/grok-4`
    pub name: String,

    /// Generation options passed to the model
    #[builder(default)]
    pub options: OptionSet,

    /// Leave this configuration out of `ALL` runs
    #[builder(default)]
    pub skip: bool,
}

impl ModelConfig {
    pub fn new(name: impl Into<String>, options: OptionSet) -> Self {
        Self {
            name: name.into(),
            options,
            skip: false,
        }
    }

    /// Filename stem for this configuration and its logs
    pub fn base_filename(&self) -> String {
        format!("{}{}", self.name.replace('/', "-"), generate_suffix(&self.options))
    }

    /// `name` alone, or `name: k1 v1, k2 v2` with options sorted by key
    pub fn display_name(&self) -> String {
        if self.options.is_empty() {
            return self.name.clone();
        }
        let options = self
            .options
            .iter()
            .map(|(k, v)| format!("{k} {v}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}: {options}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_filename_without_options() {
        let config = ModelConfig::new("gemini/gemini-2.0-flash", OptionSet::new());
        assert_eq!(config.base_filename(), "gemini-gemini-2.0-flash");
    }

    #[test]
    fn base_filename_with_options() {
        let config = ModelConfig::new(
            "openrouter/x-ai/grok-4",
            OptionSet::new().with("top_p", 0.9).with("temperature", 0.3),
        );
        assert_eq!(config.base_filename(), "openrouter-x-ai-grok-4-t03-tp09");
    }

    #[test]
    fn base_filename_is_a_single_path_component() {
        let config = ModelConfig::new(
            "openrouter/x-ai/grok-4",
            OptionSet::new().with("format", "json/strict"),
        );
        assert_eq!(config.base_filename(), "openrouter-x-ai-grok-4-fjson-strict");
        assert!(!config.base_filename().contains('/'));
    }

    #[test]
    fn display_name_without_options() {
        let config = ModelConfig::new("gpt-4o-mini", OptionSet::new());
        assert_eq!(config.display_name(), "gpt-4o-mini");
    }

    #[test]
    fn display_name_with_options() {
        let config = ModelConfig::new(
            "openrouter/x-ai/grok-4",
            OptionSet::new().with("temperature", 1.0),
        );
        assert_eq!(config.display_name(), "openrouter/x-ai/grok-4: temperature 1.0");

        let config = ModelConfig::new(
            "m",
            OptionSet::new().with("top_p", 0.9).with("max_tokens", 100_i64),
        );
        assert_eq!(config.display_name(), "m: max_tokens 100, top_p 0.9");
    }

    #[test]
    fn builder_defaults() {
        let config = ModelConfigBuilder::default()
            .name("gpt-4o-mini")
            .build()
            .unwrap();
        assert!(config.options.is_empty());
        assert!(!config.skip);
    }
}
