use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use log::{debug, error};

use crate::errors::ProviderError;
use super::{Oracle, OracleRequest, classify_status, classify_transport_error};

/// Ollama client answering oracle requests through `/api/generate`
#[derive(Debug)]
pub struct OllamaOracle {
    /// Base URL of the Ollama API
    base_url: String,
    /// Model name used for every request
    model: String,
    /// Sampling temperature
    temperature: f32,
    /// HTTP client for making requests
    client: Client,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation (default: 0.8)
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: Some(false),
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options = Some(GenerationOptions {
            temperature: Some(temperature),
        });
        self
    }
}

/// Normalize an endpoint into a base URL with scheme and port
pub fn normalize_endpoint(endpoint: &str) -> Result<String, ProviderError> {
    if endpoint.trim().is_empty() {
        return Err(ProviderError::RequestFailed("Endpoint cannot be empty".to_string()));
    }

    let with_scheme = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint {}: {}", endpoint, e)))?;
    let host = url.host_str()
        .ok_or_else(|| ProviderError::RequestFailed(format!("Invalid host in endpoint: {}", endpoint)))?;
    let port = url.port_or_known_default().unwrap_or(11434);

    Ok(format!("{}://{}:{}", url.scheme(), host, port))
}

/// Parse a generate body that may be a single JSON object or NDJSON chunks
pub fn parse_generation_body(body: &str) -> Result<GenerationResponse, ProviderError> {
    if let Ok(response) = serde_json::from_str::<GenerationResponse>(body) {
        return Ok(response);
    }

    // Streamed bodies carry one JSON object per line; the text is the concatenation.
    let mut full_response = String::new();
    let mut model = String::new();
    let mut done = false;
    let mut prompt_eval_count = None;
    let mut eval_count = None;
    let mut parsed_any = false;

    for line in body.lines().filter(|line| !line.trim().is_empty()) {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else {
            continue;
        };
        parsed_any = true;
        if let Some(part) = value.get("response").and_then(|v| v.as_str()) {
            full_response.push_str(part);
        }
        if let Some(name) = value.get("model").and_then(|v| v.as_str()) {
            model = name.to_string();
        }
        if value.get("done").and_then(|v| v.as_bool()).unwrap_or(false) {
            done = true;
            prompt_eval_count = value.get("prompt_eval_count").and_then(|v| v.as_u64());
            eval_count = value.get("eval_count").and_then(|v| v.as_u64());
            break;
        }
    }

    if !parsed_any {
        let preview: String = body.chars().take(500).collect();
        error!("Failed to parse Ollama API response. Raw response (first 500 chars): {}", preview);
        return Err(ProviderError::ParseError("Response contains invalid JSON".to_string()));
    }

    Ok(GenerationResponse {
        model,
        response: full_response,
        done,
        prompt_eval_count,
        eval_count,
    })
}

impl OllamaOracle {
    /// Create a new Ollama oracle
    ///
    /// Ollama speaks HTTP/1.1; connections are pooled so concurrent
    /// relevance queries reuse sockets.
    pub fn new_with_config(
        endpoint: &str,
        model: impl Into<String>,
        timeout_secs: u64,
        temperature: f32,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .http1_only()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(20)
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: normalize_endpoint(endpoint)?,
            model: model.into(),
            temperature,
            client,
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Generate text from the Ollama API
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self.client.post(&url)
            .json(&request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Ollama API error ({}): {}", status, error_text);
            return Err(classify_status(status.as_u16(), error_text));
        }

        let body = response.text().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to read Ollama response body: {}", e)))?;

        parse_generation_body(&body)
    }

    /// Get the Ollama API version
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response = self.client.get(&url)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status.as_u16(), format!("version endpoint returned {}", status)));
        }

        let value: serde_json::Value = response.json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Ollama version response: {}", e)))?;

        value["version"].as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::ParseError("Invalid version format in response".to_string()))
    }
}

#[async_trait]
impl Oracle for OllamaOracle {
    async fn query(&self, request: &OracleRequest) -> Result<String, ProviderError> {
        let generation = GenerationRequest::new(&self.model, &request.context)
            .system(&request.instruction)
            .temperature(self.temperature);

        let response = self.generate(generation).await?;
        debug!(
            "Ollama answered {:?} with {} chars (prompt tokens: {:?}, completion tokens: {:?})",
            request.kind, response.response.len(), response.prompt_eval_count, response.eval_count
        );
        Ok(response.response)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let version = self.version().await?;
        debug!("Connected to Ollama {} at {}", version, self.base_url);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("Ollama ({}) at {}", self.model, self.base_url)
    }
}
