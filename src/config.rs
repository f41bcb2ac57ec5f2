//! Configuration types for RFP extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The library never reads process
//! environment on its own: the API key and the pdfium location arrive here
//! explicitly, typically filled in by the CLI from flags or env vars.

use crate::error::RfpError;
use std::fmt;
use std::path::PathBuf;

/// Default chat model used for extraction.
pub const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";

/// Default OpenAI-compatible API root (without the `/chat/completions` path).
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// An API key for the model service.
///
/// Wrapped so it cannot leak through `Debug` output or tracing fields.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Wrap `key` unless it is empty or whitespace-only.
    pub fn non_empty(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    /// The raw key, for building the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Configuration for one RFP extraction.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use rfp_extract::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("gpt-4o-mini")
///     .text_budget(6000)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_tokens, 1000);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Chat model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Root of the OpenAI-compatible API. Default: [`DEFAULT_BASE_URL`].
    ///
    /// Point this at a local gateway (LiteLLM, vLLM, Ollama's OpenAI shim)
    /// to run against a self-hosted model.
    pub base_url: String,

    /// API key sent as a bearer token. `None` fails the extraction with
    /// [`RfpError::Authentication`] before any request is made.
    pub api_key: Option<Credential>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Near zero so the model copies values from the document rather than
    /// paraphrasing them.
    pub temperature: f32,

    /// Ceiling on generated tokens. Default: 1000.
    pub max_tokens: usize,

    /// Maximum characters of normalised document text sent to the model.
    /// Default: 4000.
    ///
    /// Text past the budget is cut without regard for word boundaries.
    pub text_budget: usize,

    /// Timeout for the model call in seconds. Default: 60.
    ///
    /// Expiry is reported as [`RfpError::Transport`]; nothing is retried.
    pub api_timeout_secs: u64,

    /// Custom system prompt. If None, uses the built-in default.
    pub system_prompt: Option<String>,

    /// Directory holding the pdfium shared library. If None, the library is
    /// looked up next to the executable and then through the system loader.
    pub pdfium_lib_path: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            temperature: 0.1,
            max_tokens: 1000,
            text_budget: 4000,
            api_timeout_secs: 60,
            system_prompt: None,
            pdfium_lib_path: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("text_budget", &self.text_budget)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full URL of the chat-completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn api_key(mut self, key: Credential) -> Self {
        self.config.api_key = Some(key);
        self
    }

    /// Set or clear the API key in one call; handy when mapping an optional flag.
    pub fn maybe_api_key(mut self, key: Option<Credential>) -> Self {
        self.config.api_key = key;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn text_budget(mut self, chars: usize) -> Self {
        self.config.text_budget = chars;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, RfpError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(RfpError::InvalidConfig("Model must not be empty".into()));
        }
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(RfpError::InvalidConfig(format!(
                "Base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if c.text_budget == 0 {
            return Err(RfpError::InvalidConfig(
                "Text budget must be ≥ 1 character".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(RfpError::InvalidConfig("Max tokens must be ≥ 1".into()));
        }
        if c.api_timeout_secs == 0 {
            return Err(RfpError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
