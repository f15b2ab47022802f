//! HTTP/WebSocket Handlers

use axum::{
    Json,
    extract::{Path, State, WebSocketUpgrade, ws::{Message, WebSocket}},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};

use agent_core::{AgentError, Message as ChatMessage, Workflow};

use crate::entities::{EntitySummary, Runnable};
use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider_configured: bool,
    pub provider_connected: bool,
}

#[derive(Serialize)]
pub struct EntitiesResponse {
    pub entities: Vec<EntitySummary>,
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RunResponse {
    Agent {
        entity: String,
        message: String,
        conversation_id: String,
    },
    Workflow {
        entity: String,
        outputs: Vec<String>,
        trace: Vec<String>,
        conversation_id: String,
    },
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

fn unknown_entity(id: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, "ENTITY_NOT_FOUND", format!("No entity named '{}'", id))
}

fn run_failed(id: &str, code: &str, e: &AgentError) -> ApiError {
    tracing::error!(entity = %id, error = %e, "Run failed");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, code, e.user_message())
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider_connected = state.provider_configured && state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider_configured: state.provider_configured,
        provider_connected,
    })
}

/// List the served agents and workflows
pub async fn list_entities(State(state): State<AppState>) -> Json<EntitiesResponse> {
    Json(EntitiesResponse {
        entities: state.entities.summaries(),
    })
}

/// Run an agent or workflow on one user message (non-streaming)
pub async fn run_entity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RunRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    let entity = state.entities.get(&id).ok_or_else(|| unknown_entity(&id))?;

    let conversation_id = payload
        .conversation_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::info!(entity = %id, conversation_id = %conversation_id, "Running entity");

    let response = match &entity.runnable {
        Runnable::Agent(agent) => {
            let message = agent
                .ask(&payload.message)
                .await
                .map_err(|e| run_failed(&id, "AGENT_ERROR", &e))?;

            RunResponse::Agent {
                entity: id,
                message,
                conversation_id,
            }
        }
        Runnable::Workflow(workflow) => {
            let run = workflow
                .run(payload.message)
                .await
                .map_err(|e| run_failed(&id, "WORKFLOW_ERROR", &e))?;

            RunResponse::Workflow {
                entity: id,
                outputs: run.outputs,
                trace: run.trace,
                conversation_id,
            }
        }
    };

    Ok(Json(response))
}

/// WebSocket streaming for one entity
pub async fn stream_entity(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    if state.entities.get(&id).is_none() {
        return unknown_entity(&id).into_response();
    }
    ws.on_upgrade(move |socket| handle_stream(socket, state, id))
}

async fn handle_stream(socket: WebSocket, state: AppState, id: String) {
    let (sender, receiver) = socket.split();
    serve_stream(sender, receiver, &state, &id).await;
}

async fn send_json<S>(sender: &mut S, value: serde_json::Value) -> bool
where
    S: Sink<Message> + Unpin,
{
    sender.send(Message::Text(value.to_string().into())).await.is_ok()
}

async fn send_error<S>(sender: &mut S, error: impl std::fmt::Display)
where
    S: Sink<Message> + Unpin,
{
    let _ = send_json(sender, serde_json::json!({"type": "error", "error": error.to_string()})).await;
}

/// Frame loop behind the stream endpoint: one run per text message
async fn serve_stream<S, R, E>(mut sender: S, mut receiver: R, state: &AppState, id: &str)
where
    S: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::error!("WebSocket error: {}", e);
                break;
            }
            _ => continue,
        };

        let request: RunRequest = match serde_json::from_str(&msg) {
            Ok(r) => r,
            Err(e) => {
                send_error(&mut sender, e).await;
                continue;
            }
        };

        let Some(entity) = state.entities.get(id) else {
            break;
        };

        let keep_open = match &entity.runnable {
            Runnable::Agent(agent) => stream_agent(&mut sender, state, agent, request.message).await,
            Runnable::Workflow(workflow) => stream_workflow(&mut sender, workflow, request.message).await,
        };
        if !keep_open {
            break;
        }
    }
}

/// Stream a single completion with the agent's instructions; tools are not run
async fn stream_agent<S>(sender: &mut S, state: &AppState, agent: &agent_core::Agent, text: String) -> bool
where
    S: Sink<Message> + Unpin,
{
    let messages = vec![
        ChatMessage::system(agent.config().instructions.clone()),
        ChatMessage::user(text),
    ];

    match state.provider.complete_stream(&messages, &agent.config().generation).await {
        Ok(mut stream) => {
            while let Some(result) = stream.next().await {
                match result {
                    Ok(chunk) => {
                        let response = serde_json::json!({
                            "type": "chunk",
                            "content": chunk.delta,
                            "done": chunk.done,
                        });
                        if !send_json(sender, response).await {
                            return false;
                        }
                    }
                    Err(e) => {
                        send_error(sender, e.user_message()).await;
                        break;
                    }
                }
            }
        }
        Err(e) => send_error(sender, e.user_message()).await,
    }
    true
}

/// Run the workflow and send each output, then the trace
async fn stream_workflow<S>(sender: &mut S, workflow: &Workflow, text: String) -> bool
where
    S: Sink<Message> + Unpin,
{
    match workflow.run(text).await {
        Ok(run) => {
            for output in run.outputs {
                if !send_json(sender, serde_json::json!({"type": "output", "content": output})).await {
                    return false;
                }
            }
            send_json(sender, serde_json::json!({"type": "done", "trace": run.trace})).await
        }
        Err(e) => {
            send_error(sender, e.user_message()).await;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use agent_runtime::ScriptedProvider;
    use agent_tools::Toolbox;
    use agent_tools::market::MockMarketData;
    use agent_tools::search::{MockSearchClient, UserLocation};
    use agent_tools::weather::MockWeatherClient;
    use chrono::NaiveDate;
    use futures::channel::mpsc;
    use serde_json::{Value, json};

    use crate::entities::build_catalog;

    fn state(provider: Arc<ScriptedProvider>) -> AppState {
        let toolbox = Toolbox::new(
            Arc::new(MockWeatherClient::new()),
            Arc::new(MockMarketData::new()),
            Arc::new(MockSearchClient::new()),
            UserLocation::default(),
        );
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let entities = build_catalog(provider.clone(), &toolbox, "gpt-4.1-mini", today).unwrap();

        AppState {
            provider,
            provider_configured: true,
            entities: Arc::new(entities),
        }
    }

    /// Feed text messages through the frame loop and collect the JSON frames sent back
    async fn exchange(state: &AppState, id: &str, inputs: &[&str]) -> Vec<Value> {
        let incoming: Vec<std::result::Result<Message, axum::Error>> =
            inputs.iter().map(|text| Ok(Message::Text((*text).into()))).collect();
        let (tx, rx) = mpsc::unbounded();

        serve_stream(tx, futures::stream::iter(incoming), state, id).await;

        rx.map(|frame| match frame {
            Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
            other => panic!("unexpected frame {:?}", other),
        })
        .collect()
        .await
    }

    #[tokio::test]
    async fn test_workflow_streams_outputs_then_trace() {
        let provider = Arc::new(ScriptedProvider::with_replies([
            r#"{"intent":"chat","user_message":"hello"}"#,
            "Hello there!",
        ]));

        let frames = exchange(&state(provider), "research_workflow", &[r#"{"message":"hello"}"#]).await;

        assert_eq!(
            frames,
            vec![
                json!({"type": "output", "content": "Hello there!"}),
                json!({"type": "done", "trace": ["intent_agent", "to_chat_executor", "chat_executor"]}),
            ]
        );
    }

    #[tokio::test]
    async fn test_workflow_parse_failure_sends_error_frame() {
        let provider = Arc::new(ScriptedProvider::with_replies([
            r#"{"intent":"research","user_message":"research the economic outlook for France"}"#,
            "Here is my plan: look at GDP.",
        ]));

        let frames = exchange(
            &state(provider),
            "research_workflow",
            &[r#"{"message":"research the economic outlook for France"}"#],
        )
        .await;

        assert_eq!(
            frames,
            vec![json!({"type": "error", "error": "The model returned a response in an unexpected format."})]
        );
    }

    #[tokio::test]
    async fn test_agent_streams_chunks() {
        let provider = Arc::new(ScriptedProvider::with_replies(["Clear skies today"]));
        let state = state(provider.clone());

        let frames = exchange(&state, "weather_agent", &[r#"{"message":"weather in Seoul?"}"#]).await;

        assert_eq!(
            frames,
            vec![
                json!({"type": "chunk", "content": "Clear ", "done": false}),
                json!({"type": "chunk", "content": "skies ", "done": false}),
                json!({"type": "chunk", "content": "today", "done": true}),
            ]
        );
        assert_eq!(provider.requests()[0].last_user_text(), Some("weather in Seoul?"));
    }

    #[tokio::test]
    async fn test_bad_request_keeps_socket_open() {
        let provider = Arc::new(ScriptedProvider::with_replies(["Hi"]));

        let frames = exchange(&state(provider), "search_agent", &["not json", r#"{"message":"hi"}"#]).await;

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0]["type"], "error");
        assert_eq!(frames[1], json!({"type": "chunk", "content": "Hi", "done": true}));
    }
}
