//! OpenAI-compatible LLM Provider
//!
//! Implementation of `LlmProvider` for Azure OpenAI deployments and any
//! server that speaks the OpenAI chat-completions protocol (OpenAI itself,
//! Ollama's `/v1` endpoint, vLLM, ...).

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{
        Completion, CompletionStream, FinishReason, GenerationOptions, LlmProvider, ModelInfo,
        ProviderInfo, ResponseFormat, StreamChunk, TokenUsage, DEFAULT_MODEL,
    },
};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

const DEFAULT_AZURE_API_VERSION: &str = "2024-10-21";

/// Which dialect of the chat-completions API to speak
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiFlavor {
    /// `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version=...`, `api-key` header
    Azure { api_version: String },
    /// `{endpoint}/chat/completions`, bearer token
    OpenAi,
}

/// Provider configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    pub flavor: ApiFlavor,

    /// Service base URL
    pub endpoint: String,

    /// API key (may be empty for local servers)
    pub api_key: String,

    /// Model name, or deployment name on Azure
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            flavor: ApiFlavor::Azure {
                api_version: DEFAULT_AZURE_API_VERSION.into(),
            },
            endpoint: String::new(),
            api_key: String::new(),
            model: DEFAULT_MODEL.into(),
            timeout_secs: 120,
        }
    }
}

impl OpenAiConfig {
    /// Read configuration from the environment
    ///
    /// `OPENAI_BASE_URL` switches to the plain OpenAI protocol; otherwise the
    /// `AZURE_OPENAI_*` variables are used. Missing values are left empty.
    pub fn from_env() -> Self {
        let timeout_secs = std::env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(120);

        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            return Self {
                flavor: ApiFlavor::OpenAi,
                endpoint: base_url,
                api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
                model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
                timeout_secs,
            };
        }

        Self {
            flavor: ApiFlavor::Azure {
                api_version: std::env::var("AZURE_OPENAI_API_VERSION")
                    .unwrap_or_else(|_| DEFAULT_AZURE_API_VERSION.into()),
            },
            endpoint: std::env::var("AZURE_OPENAI_ENDPOINT").unwrap_or_default(),
            api_key: std::env::var("AZURE_OPENAI_API_KEY").unwrap_or_default(),
            model: std::env::var("AZURE_OPENAI_DEPLOYMENT").unwrap_or_else(|_| DEFAULT_MODEL.into()),
            timeout_secs,
        }
    }

    /// Endpoint set, and a key present where the flavor needs one
    pub fn is_configured(&self) -> bool {
        let has_endpoint = !self.endpoint.trim().is_empty();
        match self.flavor {
            ApiFlavor::Azure { .. } => has_endpoint && !self.api_key.is_empty(),
            ApiFlavor::OpenAi => has_endpoint,
        }
    }

    fn base(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }

    fn chat_url(&self, model: &str) -> String {
        match &self.flavor {
            ApiFlavor::Azure { api_version } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                self.base(),
                model,
                api_version
            ),
            ApiFlavor::OpenAi => format!("{}/chat/completions", self.base()),
        }
    }

    fn models_url(&self) -> String {
        match &self.flavor {
            ApiFlavor::Azure { api_version } => {
                format!("{}/openai/models?api-version={}", self.base(), api_version)
            }
            ApiFlavor::OpenAi => format!("{}/models", self.base()),
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<ApiMessage<'a>>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl From<ApiUsage> for TokenUsage {
    fn from(u: ApiUsage) -> Self {
        TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }
    }
}

#[derive(Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

/// One parsed server-sent-events line
#[derive(Debug)]
enum SseLine {
    Skip,
    Done,
    Chunk(Result<StreamChunk>),
}

// ============================================================================
// Provider
// ============================================================================

/// Chat-completions provider for Azure OpenAI and OpenAI-compatible servers
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    /// Create from configuration
    pub fn from_config(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(OpenAiConfig::from_env())
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn provider_name(&self) -> &'static str {
        match self.config.flavor {
            ApiFlavor::Azure { .. } => "Azure OpenAI",
            ApiFlavor::OpenAi => "OpenAI-compatible",
        }
    }

    fn model_for<'a>(&'a self, options: &'a GenerationOptions) -> &'a str {
        if options.model.is_empty() {
            &self.config.model
        } else {
            &options.model
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.flavor {
            ApiFlavor::Azure { .. } => request.header("api-key", &self.config.api_key),
            ApiFlavor::OpenAi if self.config.api_key.is_empty() => request,
            ApiFlavor::OpenAi => request.bearer_auth(&self.config.api_key),
        }
    }

    /// Convert agent messages to wire format
    ///
    /// Tool results are sent as user context, since the agent drives tool
    /// calls through the prompt rather than native function calling.
    fn convert_messages<'a>(messages: &'a [Message], options: &'a GenerationOptions) -> Vec<ApiMessage<'a>> {
        let mut converted = Vec::with_capacity(messages.len() + 1);

        if let Some(system) = &options.system_prompt {
            if messages.first().map(|m| m.role) != Some(Role::System) {
                converted.push(ApiMessage { role: "system", content: system });
            }
        }

        converted.extend(messages.iter().map(|m| ApiMessage {
            role: match m.role {
                Role::System => "system",
                Role::User | Role::Tool => "user",
                Role::Assistant => "assistant",
            },
            content: &m.content,
        }));
        converted
    }

    fn build_response_format(format: &ResponseFormat) -> Option<serde_json::Value> {
        match format {
            ResponseFormat::Text => None,
            ResponseFormat::JsonObject => Some(serde_json::json!({"type": "json_object"})),
            ResponseFormat::JsonSchema { name, schema } => Some(serde_json::json!({
                "type": "json_schema",
                "json_schema": {
                    "name": name,
                    "schema": schema,
                    "strict": true,
                }
            })),
        }
    }

    fn build_request<'a>(
        &'a self,
        messages: &'a [Message],
        options: &'a GenerationOptions,
        stream: bool,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: match self.config.flavor {
                ApiFlavor::Azure { .. } => None,
                ApiFlavor::OpenAi => Some(self.model_for(options)),
            },
            messages: Self::convert_messages(messages, options),
            temperature: options.temperature,
            top_p: options.top_p,
            max_tokens: options.max_tokens,
            stop: (!options.stop_sequences.is_empty()).then_some(options.stop_sequences.as_slice()),
            response_format: Self::build_response_format(&options.response_format),
            stream,
        }
    }

    async fn post_chat(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
        stream: bool,
    ) -> Result<reqwest::Response> {
        if !self.config.is_configured() {
            tracing::warn!(provider = self.provider_name(), "Chat request with incomplete configuration");
        }

        let body = self.build_request(messages, options, stream);
        let url = self.config.chat_url(self.model_for(options));

        let response = self
            .authorize(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    AgentError::ProviderUnavailable(e.to_string())
                } else {
                    AgentError::Provider(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "no error details".into());
            return Err(status_error(status, detail));
        }

        Ok(response)
    }

    fn convert_completion(response: ChatResponse, model: &str) -> Result<Completion> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Provider("response contained no choices".into()))?;

        let finish_reason = choice.finish_reason.as_deref().map(FinishReason::from_api);
        let content = match (choice.message.content, choice.message.refusal) {
            (Some(content), _) => content,
            (None, Some(refusal)) => {
                return Err(AgentError::Provider(format!("model refused: {}", refusal)));
            }
            (None, None) => String::new(),
        };

        Ok(Completion {
            content,
            model: response.model.unwrap_or_else(|| model.to_string()),
            usage: response.usage.map(TokenUsage::from),
            truncated: finish_reason == Some(FinishReason::Length),
            finish_reason,
        })
    }
}

/// Map a non-success HTTP status to an agent error
fn status_error(status: StatusCode, detail: String) -> AgentError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(detail),
        StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(detail),
        s if s.is_server_error() => AgentError::ProviderUnavailable(format!("{}: {}", s, detail)),
        s => AgentError::Provider(format!("{}: {}", s, detail)),
    }
}

fn parse_sse_line(line: &str) -> SseLine {
    let Some(data) = line.strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let data = data.trim();
    if data.is_empty() {
        return SseLine::Skip;
    }
    if data == "[DONE]" {
        return SseLine::Done;
    }

    let parsed: StreamResponse = match serde_json::from_str(data) {
        Ok(parsed) => parsed,
        Err(e) => return SseLine::Chunk(Err(AgentError::Provider(format!("bad stream chunk: {}", e)))),
    };

    let usage = parsed.usage.map(TokenUsage::from);
    let (delta, done) = parsed
        .choices
        .into_iter()
        .next()
        .map(|c| (c.delta.content.unwrap_or_default(), c.finish_reason.is_some()))
        .unwrap_or_default();

    if delta.is_empty() && !done && usage.is_none() {
        return SseLine::Skip;
    }
    SseLine::Chunk(Ok(StreamChunk { delta, done, usage }))
}

/// Split a server-sent-event byte stream into completion chunks
///
/// Events may arrive split across network reads; bytes are buffered until a
/// full line is available.
fn sse_chunks<S, B, E>(bytes: S) -> CompletionStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: std::fmt::Display + Send,
{
    // State: (byte stream, pending bytes, finished)
    let stream = futures::stream::unfold(
        (Box::pin(bytes), Vec::<u8>::new(), false),
        |(mut bytes, mut pending, finished)| async move {
            if finished {
                return None;
            }
            loop {
                if let Some(pos) = pending.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = pending.drain(..=pos).collect();
                    match parse_sse_line(String::from_utf8_lossy(&line).trim()) {
                        SseLine::Skip => continue,
                        SseLine::Done => {
                            let last = StreamChunk { delta: String::new(), done: true, usage: None };
                            return Some((Ok(last), (bytes, pending, true)));
                        }
                        SseLine::Chunk(chunk) => {
                            let stop = chunk.is_err();
                            return Some((chunk, (bytes, pending, stop)));
                        }
                    }
                }

                match bytes.next().await {
                    Some(Ok(data)) => pending.extend_from_slice(data.as_ref()),
                    Some(Err(e)) => {
                        return Some((Err(AgentError::Provider(e.to_string())), (bytes, pending, true)));
                    }
                    None => return None,
                }
            }
        },
    );

    Box::pin(stream)
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        let models = self.list_models().await.unwrap_or_default();

        Ok(ProviderInfo {
            name: self.provider_name().into(),
            version: match &self.config.flavor {
                ApiFlavor::Azure { api_version } => Some(api_version.clone()),
                ApiFlavor::OpenAi => None,
            },
            models,
            supports_streaming: true,
            supports_structured_output: true,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        if !self.config.is_configured() {
            tracing::warn!(provider = self.provider_name(), "Provider endpoint or API key not set");
            return Ok(false);
        }

        let response = self
            .authorize(self.client.get(self.config.models_url()))
            .send()
            .await;

        match response {
            Ok(r) if r.status().is_success() => Ok(true),
            Ok(r) => {
                tracing::warn!(status = %r.status(), "{} health check failed", self.provider_name());
                Ok(false)
            }
            Err(e) => {
                tracing::warn!("{} health check failed: {}", self.provider_name(), e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let response = self.post_chat(messages, options, false).await?;
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("invalid completion body: {}", e)))?;

        Self::convert_completion(body, self.model_for(options))
    }

    async fn complete_stream(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<CompletionStream> {
        let response = self.post_chat(messages, options, true).await?;
        Ok(sse_chunks(response.bytes_stream()))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        if let ApiFlavor::Azure { .. } = self.config.flavor {
            // Azure routes by deployment; the configured one is what agents use
            return Ok(vec![ModelInfo {
                id: self.config.model.clone(),
                name: self.config.model.clone(),
                context_length: None,
            }]);
        }

        let response = self
            .authorize(self.client.get(self.config.models_url()))
            .send()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(status_error(status, detail));
        }

        let list: ModelList = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(e.to_string()))?;

        Ok(list
            .data
            .into_iter()
            .map(|m| ModelInfo {
                name: m.id.clone(),
                id: m.id,
                context_length: None,
            })
            .collect())
    }
}
