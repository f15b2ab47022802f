//! Reasoning Loop
//!
//! Implements the ReAct (Reason + Act) pattern for agent behavior.
//! The agent observes, thinks, acts (via tools), and responds.

use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message, Role};
use crate::provider::{GenerationOptions, LlmProvider, ResponseFormat};
use crate::structured::StructuredOutput;
use crate::tool::{Tool, ToolCall, ToolMode, ToolRegistry, ToolResult};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Display name, also attached to assistant messages
    pub name: String,

    /// System instructions
    pub instructions: String,

    /// Maximum reasoning iterations before giving up
    pub max_iterations: usize,

    /// Generation options
    pub generation: GenerationOptions,

    /// Tool usage policy
    pub tool_mode: ToolMode,

    /// Whether to append tool descriptions to the instructions
    pub inject_tool_descriptions: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "assistant".into(),
            instructions: DEFAULT_INSTRUCTIONS.into(),
            max_iterations: 10,
            generation: GenerationOptions::default(),
            tool_mode: ToolMode::Auto,
            inject_tool_descriptions: true,
        }
    }
}

const DEFAULT_INSTRUCTIONS: &str = "You are a helpful AI assistant. Be concise and accurate.";

const TOOL_REQUIRED_REMINDER: &str = "You must call at least one of the available tools before giving your final answer. \
Respond with a ```tool block now.";

/// Final answer of an agent run plus the messages produced along the way
#[derive(Clone, Debug)]
pub struct AgentRunResponse {
    /// Final assistant text
    pub text: String,

    /// Assistant and tool messages appended during the run
    pub messages: Vec<Message>,

    /// Number of tool calls executed
    pub tool_calls: usize,
}

/// An agent: instructions, a model client and the tools it may call
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// Build the full system prompt including tool descriptions
    fn build_system_prompt(&self) -> String {
        let mut prompt = self.config.instructions.clone();

        if self.uses_tools() && self.config.inject_tool_descriptions {
            prompt.push_str("\n\n");
            prompt.push_str(&self.tools.generate_prompt_section());
        }

        prompt
    }

    fn uses_tools(&self) -> bool {
        self.config.tool_mode != ToolMode::None && !self.tools.is_empty()
    }

    /// Run the agent over a conversation, appending its messages to it
    pub async fn run(&self, conversation: &mut Conversation) -> Result<String> {
        conversation.truncate_to_fit();
        let before = conversation.len();
        let response = self.drive(conversation).await?;
        tracing::debug!(
            agent = %self.config.name,
            added = conversation.len() - before,
            tool_calls = response.tool_calls,
            "Agent run finished"
        );
        Ok(response.text)
    }

    /// Run the agent on a caller-provided message list
    pub async fn respond(&self, messages: Vec<Message>) -> Result<AgentRunResponse> {
        let mut conversation = Conversation::from_messages(messages);
        self.drive(&mut conversation).await
    }

    /// Run with a simple string input (creates temporary conversation)
    pub async fn ask(&self, question: &str) -> Result<String> {
        let mut conversation = Conversation::new();
        conversation.push(Message::user(question));
        self.run(&mut conversation).await
    }

    async fn drive(&self, conversation: &mut Conversation) -> Result<AgentRunResponse> {
        if conversation.messages().first().map(|m| m.role) != Some(Role::System) {
            conversation
                .messages_mut()
                .insert(0, Message::system(self.build_system_prompt()));
        }

        let start = conversation.len();
        let mut tool_calls = 0;
        let mut iterations = 0;

        loop {
            iterations += 1;

            if iterations > self.config.max_iterations {
                return Err(AgentError::MaxIterations(self.config.max_iterations));
            }

            let completion = self.provider
                .complete(conversation.messages(), &self.config.generation)
                .await?;

            let content = completion.content;
            conversation.push(Message::assistant(&content).with_name(&self.config.name));

            if self.uses_tools() {
                if let Some(tool_call) = parse_tool_call(&content) {
                    tracing::debug!(agent = %self.config.name, tool = %tool_call.name, "Executing tool");

                    let result = self.execute_tool(&tool_call).await;
                    tool_calls += 1;

                    conversation.push(Message::tool(format_tool_result(&result), tool_call.id.clone()));
                    continue;
                }

                if self.config.tool_mode == ToolMode::Required && tool_calls == 0 {
                    tracing::debug!(agent = %self.config.name, "Answer without required tool call, reminding");
                    conversation.push(Message::user(TOOL_REQUIRED_REMINDER));
                    continue;
                }
            }

            let messages = conversation.messages()[start..].to_vec();
            return Ok(AgentRunResponse {
                text: content,
                messages,
                tool_calls,
            });
        }
    }

    /// Execute a tool call; failures become failed results, never errors
    async fn execute_tool(&self, call: &ToolCall) -> ToolResult {
        match self.tools.execute(call).await {
            Ok(mut result) => {
                result.id = call.id.clone();
                result
            }
            Err(e) => ToolResult {
                name: call.name.clone(),
                id: call.id.clone(),
                success: false,
                output: format!("Error: {}", e),
                data: None,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }
}

/// Parse a tool call from an LLM response
///
/// Looks for a ```tool fenced block first, then for an inline JSON object
/// carrying a `"tool"` key.
pub fn parse_tool_call(content: &str) -> Option<ToolCall> {
    let tool_start = "```tool";
    let tool_end = "```";

    if let Some(start_idx) = content.find(tool_start) {
        let after_marker = &content[start_idx + tool_start.len()..];
        if let Some(end_idx) = after_marker.find(tool_end) {
            let json_str = after_marker[..end_idx].trim();

            if let Ok(mut call) = serde_json::from_str::<ToolCall>(json_str) {
                if call.id.is_none() {
                    call.id = Some(uuid::Uuid::new_v4().to_string());
                }
                return Some(call);
            }
        }
    }

    parse_inline_tool_call(content)
}

fn parse_inline_tool_call(content: &str) -> Option<ToolCall> {
    if !content.contains(r#""tool""#) {
        return None;
    }

    let start = content.find('{')?;
    let end = content.rfind('}')?;

    if end <= start {
        return None;
    }

    let mut call = serde_json::from_str::<ToolCall>(&content[start..=end]).ok()?;
    if call.id.is_none() {
        call.id = Some(uuid::Uuid::new_v4().to_string());
    }
    Some(call)
}

fn format_tool_result(result: &ToolResult) -> String {
    if result.success {
        format!("[Tool '{}' returned]\n{}", result.name, result.output)
    } else {
        format!("[Tool '{}' failed]\n{}", result.name, result.output)
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            config: AgentConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.config.instructions = instructions.into();
        self
    }

    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn shared_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.register_shared(tool);
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn tool_mode(mut self, mode: ToolMode) -> Self {
        self.config.tool_mode = mode;
        self
    }

    /// Ask the model for JSON matching `T`
    pub fn response_format<T: StructuredOutput>(mut self) -> Self {
        self.config.generation.response_format = ResponseFormat::for_type::<T>();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self.provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        Ok(Agent::new(provider, Arc::new(self.tools), self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Completion, CompletionStream, ModelInfo, ProviderInfo};
    use crate::tool::{ParameterSchema, ToolSchema};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays canned replies and records every prompt it saw
    struct Canned {
        replies: Mutex<Vec<String>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl Canned {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for Canned {
        async fn info(&self) -> Result<ProviderInfo> {
            Err(AgentError::Other("unused".into()))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> Result<Completion> {
            self.seen.lock().unwrap().push(messages.to_vec());
            let reply = self.replies.lock().unwrap().pop()
                .ok_or_else(|| AgentError::ProviderUnavailable("out of replies".into()))?;
            Ok(Completion::text(reply, &options.model))
        }

        async fn complete_stream(&self, _: &[Message], _: &GenerationOptions) -> Result<CompletionStream> {
            Err(AgentError::Other("unused".into()))
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(Vec::new())
        }
    }

    struct CityTool;

    #[async_trait]
    impl Tool for CityTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "city_info".into(),
                description: "Facts about a city".into(),
                parameters: vec![ParameterSchema::string("city", "City name")],
                category: None,
                has_side_effects: false,
            }
        }

        async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
            let city = call.str_arg("city").unwrap_or_default();
            Ok(ToolResult::success("city_info", format!("{city} is sunny")))
        }
    }

    #[test]
    fn test_parse_tool_call_block() {
        let content = r#"Let me check that for you.
```tool
{"tool": "city_info", "arguments": {"city": "Seoul"}}
```"#;
        let call = parse_tool_call(content).unwrap();
        assert_eq!(call.name, "city_info");
        assert_eq!(call.str_arg("city"), Some("Seoul"));
        assert!(call.id.is_some());
    }

    #[test]
    fn test_parse_inline_tool_call() {
        let call = parse_tool_call(r#"{"tool": "city_info", "arguments": {"city": "Paris"}}"#).unwrap();
        assert_eq!(call.str_arg("city"), Some("Paris"));
    }

    #[test]
    fn test_plain_text_is_not_a_tool_call() {
        assert!(parse_tool_call("The weather is fine.").is_none());
        assert!(parse_tool_call(r#"{"topic": "x"}"#).is_none());
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let provider = Arc::new(Canned::new(&[
            "```tool\n{\"tool\": \"city_info\", \"arguments\": {\"city\": \"Seoul\"}}\n```",
            "Seoul is sunny today.",
        ]));
        let agent = Agent::builder()
            .provider(provider.clone())
            .tool(CityTool)
            .build()
            .unwrap();

        let answer = agent.ask("Weather in Seoul?").await.unwrap();
        assert_eq!(answer, "Seoul is sunny today.");

        let seen = provider.seen.lock().unwrap();
        let second = &seen[1];
        assert_eq!(second.last().unwrap().role, Role::Tool);
        assert!(second.last().unwrap().content.contains("Seoul is sunny"));
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_failed_result() {
        let provider = Arc::new(Canned::new(&[
            "```tool\n{\"tool\": \"missing\", \"arguments\": {}}\n```",
            "Sorry, I could not look that up.",
        ]));
        let agent = Agent::builder().provider(provider.clone()).tool(CityTool).build().unwrap();

        let response = agent.respond(vec![Message::user("hi")]).await.unwrap();
        assert_eq!(response.tool_calls, 1);
        assert!(response.messages.iter().any(|m| m.content.starts_with("[Tool 'missing' failed]")));
    }

    #[tokio::test]
    async fn test_required_tool_mode_reminds_once() {
        let provider = Arc::new(Canned::new(&[
            "I already know the answer.",
            "```tool\n{\"tool\": \"city_info\", \"arguments\": {\"city\": \"Paris\"}}\n```",
            "Paris is sunny.",
        ]));
        let agent = Agent::builder()
            .provider(provider.clone())
            .tool(CityTool)
            .tool_mode(ToolMode::Required)
            .build()
            .unwrap();

        let response = agent.respond(vec![Message::user("Paris?")]).await.unwrap();
        assert_eq!(response.text, "Paris is sunny.");
        assert_eq!(response.tool_calls, 1);
        assert_eq!(provider.seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_max_iterations() {
        let looping = "```tool\n{\"tool\": \"city_info\", \"arguments\": {\"city\": \"X\"}}\n```";
        let provider = Arc::new(Canned::new(&[looping, looping, looping]));
        let agent = Agent::builder()
            .provider(provider)
            .tool(CityTool)
            .max_iterations(2)
            .build()
            .unwrap();

        let err = agent.ask("loop").await.unwrap_err();
        assert!(matches!(err, AgentError::MaxIterations(2)));
    }

    #[test]
    fn test_builder_requires_provider() {
        assert!(matches!(AgentBuilder::new().build(), Err(AgentError::Config(_))));
    }
}
