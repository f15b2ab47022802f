//! # research-workflow
//!
//! Multi-agent research workflow with conditional routing based on user intent.
//!
//! ```text
//! intent_agent ──[chat]─────▶ to_chat_executor ──▶ chat_executor
//!      │
//!      └───────[research]──▶ to_plan_executor ──▶ plan_executor
//!                                                     │
//!                              report_executor ◀── to_report_executor
//! ```
//!
//! The intent and plan agents answer with JSON records (see [`model`]);
//! bridge steps decode those records and build the next agent's request.
//! The report agent must search the web before it writes.

pub mod bridge;
pub mod model;
pub mod prompts;
pub mod routing;

use std::sync::Arc;

use agent_core::{
    Agent, AgentExecutor, Executor, FnExecutor, LlmProvider, Result, Tool, ToolMode, Workflow,
};

pub use model::{Intent, IntentResult, ResearchTopic, ResearchTopics};
pub use prompts::{format_topics, report_prompt};
pub use routing::{Route, intent_condition, route};

pub const WORKFLOW_NAME: &str = "Research Workflow";
pub const WORKFLOW_DESCRIPTION: &str =
    "Multi-agent research workflow with conditional routing based on user intent.";

/// Tool iterations allowed to the report agent
const REPORT_MAX_ITERATIONS: usize = 12;

fn agent_executor(id: &str, agent: Agent) -> Arc<dyn Executor> {
    Arc::new(AgentExecutor::new(id, agent))
}

/// Assemble the research workflow
///
/// All four agents share `provider` and `model`; `search_tool` is given to
/// the report agent only.
pub fn build_research_workflow(
    provider: Arc<dyn LlmProvider>,
    search_tool: Arc<dyn Tool>,
    model: &str,
) -> Result<Workflow> {
    let intent = agent_executor(
        "intent_agent",
        Agent::builder()
            .provider(provider.clone())
            .name("intent_agent")
            .instructions(prompts::INTENT_PROMPT)
            .model(model)
            .response_format::<IntentResult>()
            .build()?,
    );

    let chat = agent_executor(
        "chat_executor",
        Agent::builder()
            .provider(provider.clone())
            .name("chat_agent")
            .instructions(prompts::CHAT_PROMPT)
            .model(model)
            .build()?,
    );

    let plan = agent_executor(
        "plan_executor",
        Agent::builder()
            .provider(provider.clone())
            .name("plan_agent")
            .instructions(prompts::PLAN_PROMPT)
            .model(model)
            .response_format::<ResearchTopics>()
            .build()?,
    );

    let report = agent_executor(
        "report_executor",
        Agent::builder()
            .provider(provider)
            .name("report_agent")
            .instructions(prompts::REPORT_INSTRUCTIONS)
            .model(model)
            .shared_tool(search_tool)
            .tool_mode(ToolMode::Required)
            .max_iterations(REPORT_MAX_ITERATIONS)
            .build()?,
    );

    let to_chat: Arc<dyn Executor> = Arc::new(FnExecutor::new("to_chat_executor", |event| async move {
        bridge::to_chat(&event)
    }));
    let to_plan: Arc<dyn Executor> = Arc::new(FnExecutor::new("to_plan_executor", |event| async move {
        bridge::to_plan(&event)
    }));
    let to_report: Arc<dyn Executor> = Arc::new(FnExecutor::new("to_report_executor", |event| async move {
        bridge::to_report(&event)
    }));

    Workflow::builder(WORKFLOW_NAME, WORKFLOW_DESCRIPTION)
        .set_start_executor(&intent)
        .add_conditional_edge(&intent, &to_chat, intent_condition(Intent::Chat))
        .add_edge(&to_chat, &chat)
        .add_conditional_edge(&intent, &to_plan, intent_condition(Intent::Research))
        .add_edge(&to_plan, &plan)
        .add_edge(&plan, &to_report)
        .add_edge(&to_report, &report)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{AgentError, ResponseFormat};
    use agent_runtime::ScriptedProvider;
    use agent_tools::search::{MockSearchClient, UserLocation};
    use agent_tools::tools::WebSearchTool;

    const PLAN: &str = r#"{"topics":[{"topic":"Deliveries for Tesla","steps":["Find Q3 2024 deliveries for Tesla"]},{"topic":"Margins for Tesla","steps":["Find Q3 2024 gross margin for Tesla","Find Q3 2023 gross margin for Tesla"]}],"user_message":"Research Tesla's Q3 results"}"#;

    fn setup(replies: &[&str]) -> (Arc<ScriptedProvider>, Arc<MockSearchClient>, Workflow) {
        let provider = Arc::new(ScriptedProvider::with_replies(replies.iter().copied()));
        let search = Arc::new(MockSearchClient::new().with_hit(
            "Tesla Q3 2024 deliveries",
            "https://example.test/tesla",
            "Tesla delivered 462,890 vehicles",
        ));
        let tool = Arc::new(WebSearchTool::new(search.clone(), UserLocation::default()));
        let workflow = build_research_workflow(provider.clone(), tool, "gpt-4.1-mini").unwrap();
        (provider, search, workflow)
    }

    #[tokio::test]
    async fn test_chat_route() {
        let (provider, search, workflow) = setup(&[
            r#"{"intent":"chat","user_message":"hello"}"#,
            "Hi! How can I help you today?",
        ]);

        let run = workflow.run("hello").await.unwrap();

        assert_eq!(run.trace, vec!["intent_agent", "to_chat_executor", "chat_executor"]);
        assert_eq!(run.final_output(), Some("Hi! How can I help you today?"));
        assert!(search.queries().is_empty());

        let requests = provider.requests();
        assert!(matches!(requests[0].options.response_format, ResponseFormat::JsonSchema { .. }));
        assert_eq!(requests[1].last_user_text(), Some("hello"));
        assert_eq!(requests[1].system_text(), Some(prompts::CHAT_PROMPT));
    }

    #[tokio::test]
    async fn test_research_route() {
        let (provider, search, workflow) = setup(&[
            r#"{"intent":"research","user_message":"Research Tesla's Q3 results"}"#,
            PLAN,
            "```tool\n{\"tool\": \"web_search\", \"arguments\": {\"query\": \"Tesla Q3 2024 deliveries\"}}\n```",
            "Tesla delivered 462,890 vehicles in Q3 2024.",
        ]);

        let run = workflow.run("Research Tesla's Q3 results").await.unwrap();

        assert_eq!(
            run.trace,
            vec!["intent_agent", "to_plan_executor", "plan_executor", "to_report_executor", "report_executor"]
        );
        assert_eq!(run.outputs, vec!["Tesla delivered 462,890 vehicles in Q3 2024.".to_string()]);
        assert_eq!(search.queries(), vec!["Tesla Q3 2024 deliveries".to_string()]);

        let requests = provider.requests();
        let report_input = requests[2].last_user_text().unwrap();
        assert!(report_input.starts_with("<research_topics>\nTopics and steps: Deliveries for Tesla\n"));
        assert!(report_input.contains("- Find Q3 2023 gross margin for Tesla"));
        assert!(report_input.ends_with("<request>\nResearch Tesla's Q3 results\n</request>\n"));
    }

    #[tokio::test]
    async fn test_economic_outlook_routes_to_research() {
        let query = "research the economic outlook for France";
        let (provider, search, workflow) = setup(&[
            r#"{"intent":"research","user_message":"research the economic outlook for France"}"#,
            r#"{"topics":[{"topic":"Growth for France","steps":["Find 2025 GDP growth forecast for France"]},{"topic":"Inflation for France","steps":["Find 2025 inflation forecast for France","Find ECB rate outlook"]}],"user_message":"research the economic outlook for France"}"#,
            "```tool\n{\"tool\": \"web_search\", \"arguments\": {\"query\": \"France GDP growth forecast 2025\"}}\n```",
            "France's economy is forecast to grow modestly in 2025.",
        ]);

        let run = workflow.run(query).await.unwrap();

        assert_eq!(
            run.trace,
            vec!["intent_agent", "to_plan_executor", "plan_executor", "to_report_executor", "report_executor"]
        );
        assert_eq!(run.final_output(), Some("France's economy is forecast to grow modestly in 2025."));
        assert_eq!(search.queries(), vec!["France GDP growth forecast 2025".to_string()]);

        let requests = provider.requests();
        assert_eq!(requests[0].last_user_text(), Some(query));
        assert_eq!(requests[1].last_user_text(), Some(query));
        let report_input = requests[2].last_user_text().unwrap();
        assert!(report_input.contains("Topics and steps: Growth for France\n- Find 2025 GDP growth forecast for France"));
        assert!(report_input.contains("- Find 2025 inflation forecast for France\n- Find ECB rate outlook"));
    }

    #[tokio::test]
    async fn test_unparseable_intent_ends_silently() {
        let (provider, _, workflow) = setup(&["Sure, let me research that for you."]);

        let run = workflow.run("tell me about rust").await.unwrap();

        assert_eq!(run.trace, vec!["intent_agent"]);
        assert!(run.outputs.is_empty());
        assert_eq!(provider.remaining(), 0);
    }

    #[tokio::test]
    async fn test_bad_plan_fails_run() {
        let (_, _, workflow) = setup(&[
            r#"{"intent":"research","user_message":"Research the French economy"}"#,
            "Here is my plan: look at GDP.",
        ]);

        let err = workflow.run("Research the French economy").await.unwrap_err();
        assert!(matches!(err, AgentError::Parse(_)));
    }

    #[test]
    fn test_graph_shape() {
        let (_, _, workflow) = setup(&[]);
        let info = workflow.info();

        assert_eq!(info.name, WORKFLOW_NAME);
        assert_eq!(info.start_executor, "intent_agent");
        assert_eq!(info.executors.len(), 7);
        assert_eq!(info.edges.iter().filter(|e| e.conditional).count(), 2);
    }
}
