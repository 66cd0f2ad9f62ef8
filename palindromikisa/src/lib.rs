//! Benchmark language models on Finnish palindromes.
//!
//! Every model is run under a [`ModelConfig`]: a model name plus the options it
//! is invoked with. Configurations are persisted by [`ConfigStore`] under a
//! filename derived from both (see [`suffix`]), so repeated runs with the same
//! options accumulate into the same configuration and logs.

pub mod benchmark;
pub mod config;
mod error;
pub mod generate;
pub mod logs;
pub mod options;
pub mod pricing;
pub mod scoring;
pub mod settings;
pub mod stats;
pub mod store;
pub mod suffix;
pub mod tasks;
mod yaml;

pub use config::{ModelConfig, ModelConfigBuilder};
pub use error::StoreError;
pub use options::{OptionSet, OptionValue};
pub use settings::{Settings, SettingsBuilder};
pub use store::ConfigStore;
pub use suffix::{format_value, generate_suffix, resolve_abbreviations};
