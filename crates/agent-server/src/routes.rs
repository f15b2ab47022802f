//! Router

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{health_check, list_entities, run_entity, stream_entity};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/v1/entities", get(list_entities))
        .route("/v1/entities/{id}/run", post(run_entity))
        .route("/v1/entities/{id}/stream", get(stream_entity))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
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
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use chrono::NaiveDate;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::entities::build_catalog;

    fn app(provider: Arc<ScriptedProvider>, configured: bool) -> Router {
        let toolbox = Toolbox::new(
            Arc::new(MockWeatherClient::new().with_city("Seoul", "Clear", 21, 40)),
            Arc::new(MockMarketData::new()),
            Arc::new(MockSearchClient::new()),
            UserLocation::default(),
        );
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let entities = build_catalog(provider.clone(), &toolbox, "gpt-4.1-mini", today).unwrap();

        router(AppState {
            provider,
            provider_configured: configured,
            entities: Arc::new(entities),
        })
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_unconfigured_provider() {
        let response = app(Arc::new(ScriptedProvider::new()), false)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["provider_configured"], false);
        assert_eq!(body["provider_connected"], false);
    }

    #[tokio::test]
    async fn test_lists_entities() {
        let response = app(Arc::new(ScriptedProvider::new()), true)
            .oneshot(Request::get("/v1/entities").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = body_json(response).await;
        let ids: Vec<&str> = body["entities"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["finance_agent", "weather_agent", "search_agent", "research_workflow"]);
        assert_eq!(body["entities"][1]["tools"], json!(["get_current_weather"]));
        assert_eq!(body["entities"][3]["kind"], "workflow");
        assert_eq!(body["entities"][3]["executors"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_run_agent_with_tool() {
        let provider = Arc::new(ScriptedProvider::with_replies([
            "```tool\n{\"tool\": \"get_current_weather\", \"arguments\": {\"city\": \"Seoul\"}}\n```",
            "It is clear and 21°C in Seoul.",
        ]));

        let response = app(provider.clone(), true)
            .oneshot(post_json(
                "/v1/entities/weather_agent/run",
                &json!({"message": "Weather in Seoul?", "conversation_id": "c-1"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["entity"], "weather_agent");
        assert_eq!(body["message"], "It is clear and 21°C in Seoul.");
        assert_eq!(body["conversation_id"], "c-1");

        let tool_message = &provider.requests()[1].messages;
        assert!(tool_message.iter().any(|m| m.content.contains("temperature of 21°C")));
    }

    #[tokio::test]
    async fn test_run_workflow() {
        let provider = Arc::new(ScriptedProvider::with_replies([
            r#"{"intent":"chat","user_message":"hello"}"#,
            "Hello there!",
        ]));

        let response = app(provider, true)
            .oneshot(post_json("/v1/entities/research_workflow/run", &json!({"message": "hello"})))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["outputs"], json!(["Hello there!"]));
        assert_eq!(body["trace"], json!(["intent_agent", "to_chat_executor", "chat_executor"]));
        assert!(body["conversation_id"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[tokio::test]
    async fn test_unknown_entity_is_404() {
        let response = app(Arc::new(ScriptedProvider::new()), true)
            .oneshot(post_json("/v1/entities/nope/run", &json!({"message": "hi"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "ENTITY_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_provider_failure_is_500() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push_failure("deployment not found");

        let response = app(provider, true)
            .oneshot(post_json("/v1/entities/search_agent/run", &json!({"message": "news"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["code"], "AGENT_ERROR");
        assert_eq!(body["error"], "The AI service encountered an error: deployment not found");
    }
}
