//! Model invocation.
//!
//! The benchmark only needs to send a prompt and read back text plus usage, so
//! a model is anything implementing [`Model`]. [`connect`] maps a model name
//! with a provider prefix onto an OpenAI-compatible chat completions endpoint.

use crate::config::ModelConfig;
#[cfg(feature = "run")]
use crate::options::{OptionSet, OptionValue};

#[derive(Clone, Debug, Default)]
pub struct ModelResponse {
    pub text: String,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    /// Raw provider response, consulted for reported costs
    pub metadata: serde_json::Value,
}

pub trait Model {
    fn name(&self) -> &str;
    fn prompt(&self, text: &str) -> anyhow::Result<ModelResponse>;
}

/// Provider endpoint for a `provider/model` name
#[derive(Clone, Debug, PartialEq)]
pub struct Endpoint {
    pub base_url: String,
    pub api_key_env: Option<&'static str>,
    /// Model name as the provider expects it
    pub model: String,
}

/// Resolve the provider from the model name prefix
pub fn endpoint_for(provider_slash_model: &str) -> anyhow::Result<Endpoint> {
    let (base_url, api_key_env, model) = match provider_slash_model.split_once('/') {
        Some(("openrouter", m)) => ("https://openrouter.ai/api/v1", Some("OPENROUTER_API_KEY"), m),
        Some(("openai", m)) => ("https://api.openai.com/v1", Some("OPENAI_API_KEY"), m),
        Some(("gemini", m)) => (
            "https://generativelanguage.googleapis.com/v1beta/openai",
            Some("GEMINI_API_KEY"),
            m,
        ),
        Some(("ollama", m)) => ("http://localhost:11434/v1", None, m),
        // bare names are OpenAI models, as in `gpt-4o-mini`
        None => ("https://api.openai.com/v1", Some("OPENAI_API_KEY"), provider_slash_model),
        Some((provider, _)) => {
            return Err(anyhow::anyhow!("Unsupported model provider '{provider}'"));
        }
    };
    Ok(Endpoint {
        base_url: base_url.to_string(),
        api_key_env,
        model: model.to_string(),
    })
}

#[cfg(feature = "run")]
pub struct OpenAiCompatModel {
    name: String,
    endpoint: Endpoint,
    api_key: Option<String>,
    options: OptionSet,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "run")]
#[derive(serde::Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[cfg(feature = "run")]
#[derive(serde::Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[cfg(feature = "run")]
#[derive(serde::Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(feature = "run")]
#[derive(serde::Deserialize)]
struct Usage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
}

#[cfg(feature = "run")]
fn option_to_json(value: &OptionValue) -> serde_json::Value {
    match value {
        OptionValue::Bool(b) => (*b).into(),
        OptionValue::Int(i) => (*i).into(),
        OptionValue::Float(f) => (*f).into(),
        OptionValue::Str(s) => s.clone().into(),
    }
}

#[cfg(feature = "run")]
impl OpenAiCompatModel {
    fn request_body(&self, text: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.endpoint.model,
            "messages": [{ "role": "user", "content": text }],
        });
        if let Some(map) = body.as_object_mut() {
            for (name, value) in self.options.iter() {
                map.insert(name.to_string(), option_to_json(value));
            }
            if self.endpoint.base_url.contains("openrouter") {
                // ask OpenRouter to report the actual cost in `usage`
                map.insert("usage".into(), serde_json::json!({ "include": true }));
            }
        }
        body
    }
}

#[cfg(feature = "run")]
impl Model for OpenAiCompatModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn prompt(&self, text: &str) -> anyhow::Result<ModelResponse> {
        let url = format!("{}/chat/completions", self.endpoint.base_url);
        let mut request = self.client.post(&url).json(&self.request_body(text));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send()?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(anyhow::anyhow!("{} request failed with status {status}: {body}", self.name));
        }

        let metadata: serde_json::Value = response.json()?;
        let completion: ChatCompletion = serde_json::from_value(metadata.clone())?;
        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        let (input_tokens, output_tokens) = completion
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((None, None));

        Ok(ModelResponse {
            text,
            input_tokens,
            output_tokens,
            metadata,
        })
    }
}

/// Connect to the model described by `config`. Fails early when the provider
/// is unknown or its API key is not set.
#[cfg(feature = "run")]
pub fn connect(config: &ModelConfig) -> anyhow::Result<Box<dyn Model>> {
    let endpoint = endpoint_for(&config.name)?;
    let api_key = match endpoint.api_key_env {
        Some(var) => Some(::std::env::var(var).map_err(|_| {
            anyhow::anyhow!("Model '{}' needs the {var} environment variable", config.name)
        })?),
        None => None,
    };

    Ok(Box::new(OpenAiCompatModel {
        name: config.name.clone(),
        endpoint,
        api_key,
        options: config.options.clone(),
        client: reqwest::blocking::Client::builder()
            .timeout(::std::time::Duration::from_secs(600))
            .build()?,
    }))
}

#[cfg(not(feature = "run"))]
pub fn connect(config: &ModelConfig) -> anyhow::Result<Box<dyn Model>> {
    Err(anyhow::anyhow!(
        "Cannot run '{}': built without the `run` feature",
        config.name
    ))
}
