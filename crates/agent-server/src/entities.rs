//! Entity Catalogue
//!
//! The agents and workflows the server exposes, addressed by id.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use agent_core::{Agent, LlmProvider, Result, Workflow};
use agent_tools::{SEARCH_AGENT_PROMPT, Toolbox, WEATHER_AGENT_PROMPT, finance_instructions};
use research_workflow::build_research_workflow;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Agent,
    Workflow,
}

pub enum Runnable {
    Agent(Agent),
    Workflow(Workflow),
}

pub struct Entity {
    pub id: String,
    pub name: String,
    pub description: String,
    pub runnable: Runnable,
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self.runnable {
            Runnable::Agent(_) => EntityKind::Agent,
            Runnable::Workflow(_) => EntityKind::Workflow,
        }
    }

    pub fn summary(&self) -> EntitySummary {
        let (tools, executors) = match &self.runnable {
            Runnable::Agent(agent) => (agent.tools().names().into_iter().map(String::from).collect(), Vec::new()),
            Runnable::Workflow(workflow) => (Vec::new(), workflow.info().executors),
        };

        EntitySummary {
            id: self.id.clone(),
            kind: self.kind(),
            name: self.name.clone(),
            description: self.description.clone(),
            tools,
            executors,
        }
    }
}

/// Listing entry for `GET /v1/entities`
#[derive(Clone, Debug, Serialize)]
pub struct EntitySummary {
    pub id: String,
    pub kind: EntityKind,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub executors: Vec<String>,
}

#[derive(Default)]
pub struct EntityCatalog {
    entities: Vec<Entity>,
}

impl EntityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn summaries(&self) -> Vec<EntitySummary> {
        self.entities.iter().map(Entity::summary).collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|e| e.id.as_str())
    }
}

/// The finance, weather and search agents plus the research workflow
pub fn build_catalog(
    provider: Arc<dyn LlmProvider>,
    toolbox: &Toolbox,
    model: &str,
    today: NaiveDate,
) -> Result<EntityCatalog> {
    let mut catalog = EntityCatalog::new();

    catalog.add(Entity {
        id: "finance_agent".into(),
        name: "Finance Agent".into(),
        description: "Stock prices, currency rates and weather, planned step by step".into(),
        runnable: Runnable::Agent(
            Agent::builder()
                .provider(provider.clone())
                .name("Finance Agent")
                .instructions(finance_instructions(today))
                .model(model)
                .tools(toolbox.finance_tools())
                .build()?,
        ),
    });

    catalog.add(Entity {
        id: "weather_agent".into(),
        name: "Weather Agent".into(),
        description: "Current weather for any city".into(),
        runnable: Runnable::Agent(
            Agent::builder()
                .provider(provider.clone())
                .name("Weather Agent")
                .instructions(WEATHER_AGENT_PROMPT)
                .model(model)
                .tools(toolbox.weather_tools())
                .build()?,
        ),
    });

    catalog.add(Entity {
        id: "search_agent".into(),
        name: "Web Search Agent".into(),
        description: "Answers questions with web search".into(),
        runnable: Runnable::Agent(
            Agent::builder()
                .provider(provider.clone())
                .name("Web Search Agent")
                .instructions(SEARCH_AGENT_PROMPT)
                .model(model)
                .tools(toolbox.search_tools())
                .build()?,
        ),
    });

    let workflow = build_research_workflow(provider, toolbox.web_search_tool(), model)?;
    catalog.add(Entity {
        id: "research_workflow".into(),
        name: workflow.name().to_string(),
        description: workflow.description().to_string(),
        runnable: Runnable::Workflow(workflow),
    });

    Ok(catalog)
}
