//! Cost of a model call.
//!
//! A cost reported by the provider (OpenRouter puts it in `usage.cost`) wins;
//! otherwise the LiteLLM price table is consulted. The table is held by a
//! [`PricingCache`] that the caller owns and passes around: it is read from
//! disk on first use and dropped again with [`PricingCache::invalidate`].

use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

#[cfg(feature = "run")]
pub const LITELLM_PRICING_URL: &str =
    "https://raw.githubusercontent.com/BerriAI/litellm/main/model_prices_and_context_window.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CostSource {
    OpenRouter,
    LiteLlm,
}

impl fmt::Display for CostSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostSource::OpenRouter => write!(f, "openrouter"),
            CostSource::LiteLlm => write!(f, "litellm"),
        }
    }
}

pub trait CostLookup {
    fn cost(
        &self,
        model_name: &str,
        input_tokens: u64,
        output_tokens: u64,
        metadata: &serde_json::Value,
    ) -> Option<(f64, CostSource)>;
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct ModelPricing {
    #[serde(default)]
    pub input_cost_per_token: f64,
    #[serde(default)]
    pub output_cost_per_token: f64,
}

pub struct PricingCache {
    path: PathBuf,
    table: OnceCell<HashMap<String, ModelPricing>>,
}

impl PricingCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: OnceCell::new(),
        }
    }

    /// `~/.cache/palindromikisa/pricing.json`, or a relative path when the
    /// cache directory is unknown
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("palindromikisa")
            .join("pricing.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Forget the loaded table; the next lookup reads the file again
    pub fn invalidate(&mut self) {
        self.table = OnceCell::new();
    }

    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }

    fn table(&self) -> &HashMap<String, ModelPricing> {
        self.table.get_or_init(|| load_table(&self.path))
    }

    /// Download a fresh price table into the cache file
    #[cfg(feature = "run")]
    pub fn refresh(&mut self) -> anyhow::Result<usize> {
        let raw: serde_json::Value = reqwest::blocking::get(LITELLM_PRICING_URL)?
            .error_for_status()?
            .json()?;
        let count = parse_table(&raw).len();
        if let Some(parent) = self.path.parent() {
            ::std::fs::create_dir_all(parent)?;
        }
        ::std::fs::write(&self.path, serde_json::to_string(&raw)?)?;
        self.invalidate();
        Ok(count)
    }

    /// Cost from the price table alone
    pub fn table_cost(&self, model_name: &str, input_tokens: u64, output_tokens: u64) -> Option<f64> {
        let pricing = self.table().get(&litellm_model_name(model_name))?;
        Some(
            input_tokens as f64 * pricing.input_cost_per_token
                + output_tokens as f64 * pricing.output_cost_per_token,
        )
    }
}

impl CostLookup for PricingCache {
    fn cost(
        &self,
        model_name: &str,
        input_tokens: u64,
        output_tokens: u64,
        metadata: &serde_json::Value,
    ) -> Option<(f64, CostSource)> {
        if let Some(cost) = cost_from_metadata(metadata) {
            return Some((cost, CostSource::OpenRouter));
        }
        self.table_cost(model_name, input_tokens, output_tokens)
            .map(|cost| (cost, CostSource::LiteLlm))
    }
}

fn load_table(path: &Path) -> HashMap<String, ModelPricing> {
    let raw = match ::std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("No pricing data at {} ({e}); run `update-pricing`", path.display());
            return HashMap::new();
        }
    };
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value) => {
            let table = parse_table(&value);
            debug!("Loaded pricing for {} models", table.len());
            table
        }
        Err(e) => {
            warn!("Invalid pricing data in {}: {e}", path.display());
            HashMap::new()
        }
    }
}

/// Entries that do not look like model prices (e.g. LiteLLM's `sample_spec`)
/// are ignored
fn parse_table(value: &serde_json::Value) -> HashMap<String, ModelPricing> {
    value
        .as_object()
        .map(|models| {
            models
                .iter()
                .filter_map(|(name, entry)| {
                    serde_json::from_value::<ModelPricing>(entry.clone())
                        .ok()
                        .map(|p| (name.clone(), p))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// LiteLLM keys models without the provider prefix
pub fn litellm_model_name(model_name: &str) -> String {
    match model_name.split_once('/') {
        Some(("gemini", "gemini-2.0-flash")) => "gemini-2.0-flash-exp".to_string(),
        Some((_, model)) => model.to_string(),
        None => model_name.to_string(),
    }
}

/// OpenRouter reports `usage.cost`. For bring-your-own-key calls that is 0
/// and the real amount is `usage.cost_details.upstream_inference_cost`.
pub fn cost_from_metadata(metadata: &serde_json::Value) -> Option<f64> {
    let usage = metadata.get("usage")?;
    let cost = usage.get("cost").and_then(serde_json::Value::as_f64);
    if cost == Some(0.0) {
        if let Some(upstream) = usage
            .pointer("/cost_details/upstream_inference_cost")
            .and_then(serde_json::Value::as_f64)
        {
            return Some(upstream);
        }
    }
    cost
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cache_with(content: &str) -> (tempfile::TempDir, PricingCache) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pricing.json");
        ::std::fs::write(&path, content).unwrap();
        let cache = PricingCache::new(path);
        (dir, cache)
    }

    #[test]
    fn metadata_cost_wins() {
        let (_dir, cache) = cache_with(r#"{"grok-4": {"input_cost_per_token": 1.0}}"#);
        let metadata = json!({"usage": {"cost": 0.0012}});
        assert_eq!(
            cache.cost("openrouter/grok-4", 10, 10, &metadata),
            Some((0.0012, CostSource::OpenRouter))
        );
        assert!(!cache.is_loaded());
    }

    #[test]
    fn byok_uses_upstream_cost() {
        let metadata = json!({"usage": {"cost": 0, "cost_details": {"upstream_inference_cost": 0.5}}});
        assert_eq!(cost_from_metadata(&metadata), Some(0.5));
        assert_eq!(cost_from_metadata(&json!({"usage": {"cost": 0}})), Some(0.0));
        assert_eq!(cost_from_metadata(&json!({})), None);
    }

    #[test]
    fn table_cost_from_tokens() {
        let (_dir, cache) = cache_with(
            r#"{"sample_spec": "x", "gpt-4o-mini": {"input_cost_per_token": 0.001, "output_cost_per_token": 0.002}}"#,
        );
        let (cost, source) = cache.cost("openai/gpt-4o-mini", 100, 10, &json!({})).unwrap();
        assert!((cost - 0.12).abs() < 1e-12);
        assert_eq!(source, CostSource::LiteLlm);
        assert!(cache.cost("unknown-model", 1, 1, &json!({})).is_none());
    }

    #[test]
    fn invalidate_reloads_table() {
        let (_dir, mut cache) = cache_with(r#"{"m": {"input_cost_per_token": 1.0}}"#);
        assert_eq!(cache.table_cost("m", 2, 0), Some(2.0));

        ::std::fs::write(cache.path(), r#"{"m": {"input_cost_per_token": 3.0}}"#).unwrap();
        assert_eq!(cache.table_cost("m", 2, 0), Some(2.0));

        cache.invalidate();
        assert!(!cache.is_loaded());
        assert_eq!(cache.table_cost("m", 2, 0), Some(6.0));
    }

    #[test]
    fn missing_file_means_no_prices() {
        let cache = PricingCache::new("/nonexistent/pricing.json");
        assert!(cache.table_cost("gpt-4o", 1, 1).is_none());
    }

    #[test]
    fn litellm_names() {
        assert_eq!(litellm_model_name("anthropic/claude-3-haiku-20240307"), "claude-3-haiku-20240307");
        assert_eq!(litellm_model_name("gemini/gemini-2.0-flash"), "gemini-2.0-flash-exp");
        assert_eq!(litellm_model_name("gpt-4o-mini"), "gpt-4o-mini");
    }
}
