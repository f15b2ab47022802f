//! Workflow Graph
//!
//! Directed graph of executors joined by (optionally conditional) edges.
//! Executors exchange [`WorkflowEvent`]s; a run starts by sending the user
//! input as a request to the start executor and ends when no messages are
//! left in flight.
//!
//! ```text
//!   start ──[cond a]──▶ bridge_a ──▶ agent_a
//!     │
//!     └────[cond b]──▶ bridge_b ──▶ agent_b ──▶ ...
//! ```

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::Serialize;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::reasoning::Agent;

/// Default bound on delivered messages per run
pub const DEFAULT_MAX_STEPS: usize = 64;

/// Input for an agent executor
#[derive(Clone, Debug)]
pub struct AgentRequest {
    pub messages: Vec<Message>,

    /// When false the agent records nothing and stays silent
    pub should_respond: bool,
}

impl AgentRequest {
    /// A single user message that expects an answer
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(text)],
            should_respond: true,
        }
    }
}

/// Reply produced by an agent executor
#[derive(Clone, Debug)]
pub struct AgentResponse {
    /// Executor that produced the reply
    pub executor_id: String,

    /// Final assistant text
    pub text: String,

    /// Assistant and tool messages produced during the run
    pub messages: Vec<Message>,
}

/// Message travelling along workflow edges
#[derive(Clone, Debug)]
pub enum WorkflowEvent {
    Request(AgentRequest),
    Response(AgentResponse),
    /// Text yielded as workflow output
    Output(String),
}

impl WorkflowEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowEvent::Request(_) => "request",
            WorkflowEvent::Response(_) => "response",
            WorkflowEvent::Output(_) => "output",
        }
    }
}

/// Per-delivery context handed to an executor
#[derive(Debug, Default)]
pub struct WorkflowContext {
    outgoing: Vec<WorkflowEvent>,
    outputs: Vec<String>,
    terminal: bool,
}

impl WorkflowContext {
    fn new(terminal: bool) -> Self {
        Self {
            terminal,
            ..Default::default()
        }
    }

    /// Forward a message along this executor's outgoing edges
    pub fn send_message(&mut self, event: WorkflowEvent) {
        self.outgoing.push(event);
    }

    /// Emit text as workflow output
    pub fn yield_output(&mut self, text: impl Into<String>) {
        self.outputs.push(text.into());
    }

    /// Whether the executor has no outgoing edges
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }
}

/// A node in the workflow graph
#[async_trait]
pub trait Executor: Send + Sync {
    fn id(&self) -> &str;

    async fn handle(&self, event: WorkflowEvent, ctx: &mut WorkflowContext) -> Result<()>;
}

/// Runs an agent for every incoming request
pub struct AgentExecutor {
    id: String,
    agent: Agent,
}

impl AgentExecutor {
    pub fn new(id: impl Into<String>, agent: Agent) -> Self {
        Self { id: id.into(), agent }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }
}

#[async_trait]
impl Executor for AgentExecutor {
    fn id(&self) -> &str {
        &self.id
    }

    async fn handle(&self, event: WorkflowEvent, ctx: &mut WorkflowContext) -> Result<()> {
        let request = match event {
            WorkflowEvent::Request(request) => request,
            other => {
                return Err(AgentError::Workflow(format!(
                    "executor '{}' expects a request, got a {}",
                    self.id,
                    other.kind()
                )));
            }
        };

        if !request.should_respond {
            tracing::debug!(executor = %self.id, "Request does not ask for a response");
            return Ok(());
        }

        let response = self.agent.respond(request.messages).await?;
        tracing::info!(executor = %self.id, tool_calls = response.tool_calls, "Agent responded");

        if ctx.is_terminal() {
            ctx.yield_output(response.text.clone());
        }
        ctx.send_message(WorkflowEvent::Response(AgentResponse {
            executor_id: self.id.clone(),
            text: response.text,
            messages: response.messages,
        }));
        Ok(())
    }
}

type Handler = Box<dyn Fn(WorkflowEvent) -> BoxFuture<'static, Result<WorkflowEvent>> + Send + Sync>;

/// Executor backed by an async function that maps one event to the next
pub struct FnExecutor {
    id: String,
    handler: Handler,
}

impl FnExecutor {
    pub fn new<F, Fut>(id: impl Into<String>, f: F) -> Self
    where
        F: Fn(WorkflowEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<WorkflowEvent>> + Send + 'static,
    {
        Self {
            id: id.into(),
            handler: Box::new(move |event| Box::pin(f(event))),
        }
    }
}

#[async_trait]
impl Executor for FnExecutor {
    fn id(&self) -> &str {
        &self.id
    }

    async fn handle(&self, event: WorkflowEvent, ctx: &mut WorkflowContext) -> Result<()> {
        let next = (self.handler)(event).await?;
        match next {
            WorkflowEvent::Output(text) => ctx.yield_output(text),
            other => ctx.send_message(other),
        }
        Ok(())
    }
}

/// Edge predicate over the message being delivered
pub type EdgeCondition = Arc<dyn Fn(&WorkflowEvent) -> bool + Send + Sync>;

struct Edge {
    from: String,
    to: String,
    condition: Option<EdgeCondition>,
}

impl Edge {
    fn accepts(&self, event: &WorkflowEvent) -> bool {
        self.condition.as_ref().map_or(true, |cond| cond(event))
    }
}

/// Serializable description of an edge
#[derive(Clone, Debug, Serialize)]
pub struct EdgeInfo {
    pub from: String,
    pub to: String,
    pub conditional: bool,
}

/// Serializable description of a workflow
#[derive(Clone, Debug, Serialize)]
pub struct WorkflowInfo {
    pub name: String,
    pub description: String,
    pub start_executor: String,
    pub executors: Vec<String>,
    pub edges: Vec<EdgeInfo>,
}

/// Outcome of a workflow run
#[derive(Clone, Debug, Default, Serialize)]
pub struct WorkflowRun {
    /// Texts yielded by terminal executors, in order
    pub outputs: Vec<String>,

    /// Executor ids in the order they handled a message
    pub trace: Vec<String>,
}

impl WorkflowRun {
    /// The last output, if any
    pub fn final_output(&self) -> Option<&str> {
        self.outputs.last().map(String::as_str)
    }
}

/// An executable workflow graph
pub struct Workflow {
    name: String,
    description: String,
    start: String,
    order: Vec<String>,
    executors: HashMap<String, Arc<dyn Executor>>,
    edges: Vec<Edge>,
    max_steps: usize,
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("name", &self.name)
            .field("start", &self.start)
            .field("executors", &self.order)
            .field("edges", &self.edges.len())
            .finish()
    }
}

impl Workflow {
    pub fn builder(name: impl Into<String>, description: impl Into<String>) -> WorkflowBuilder {
        WorkflowBuilder::new(name, description)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    fn is_terminal(&self, id: &str) -> bool {
        !self.edges.iter().any(|e| e.from == id)
    }

    /// Run the workflow for one user message
    pub async fn run(&self, input: impl Into<String>) -> Result<WorkflowRun> {
        let mut queue: VecDeque<(String, WorkflowEvent)> = VecDeque::new();
        queue.push_back((
            self.start.clone(),
            WorkflowEvent::Request(AgentRequest::user(input)),
        ));

        let mut run = WorkflowRun::default();
        let mut steps = 0;

        while let Some((target, event)) = queue.pop_front() {
            steps += 1;
            if steps > self.max_steps {
                return Err(AgentError::Workflow(format!(
                    "'{}' exceeded {} steps",
                    self.name, self.max_steps
                )));
            }

            let executor = self.executors.get(&target).ok_or_else(|| {
                AgentError::Workflow(format!("unknown executor '{}'", target))
            })?;

            tracing::debug!(workflow = %self.name, executor = %target, kind = event.kind(), "Delivering message");

            let mut ctx = WorkflowContext::new(self.is_terminal(&target));
            executor.handle(event, &mut ctx).await?;

            run.trace.push(target.clone());
            run.outputs.extend(ctx.outputs);

            for message in ctx.outgoing {
                let mut delivered = false;
                for edge in self.edges.iter().filter(|e| e.from == target) {
                    if edge.accepts(&message) {
                        queue.push_back((edge.to.clone(), message.clone()));
                        delivered = true;
                    }
                }
                if !delivered && !self.is_terminal(&target) {
                    tracing::warn!(
                        workflow = %self.name,
                        executor = %target,
                        kind = message.kind(),
                        "No outgoing edge accepted the message"
                    );
                }
            }
        }

        Ok(run)
    }

    pub fn info(&self) -> WorkflowInfo {
        WorkflowInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            start_executor: self.start.clone(),
            executors: self.order.clone(),
            edges: self
                .edges
                .iter()
                .map(|e| EdgeInfo {
                    from: e.from.clone(),
                    to: e.to.clone(),
                    conditional: e.condition.is_some(),
                })
                .collect(),
        }
    }
}

/// Fluent builder for [`Workflow`]
pub struct WorkflowBuilder {
    name: String,
    description: String,
    start: Option<String>,
    order: Vec<String>,
    executors: HashMap<String, Arc<dyn Executor>>,
    edges: Vec<Edge>,
    max_steps: usize,
    problems: Vec<String>,
}

impl WorkflowBuilder {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            start: None,
            order: Vec::new(),
            executors: HashMap::new(),
            edges: Vec::new(),
            max_steps: DEFAULT_MAX_STEPS,
            problems: Vec::new(),
        }
    }

    fn register(&mut self, executor: &Arc<dyn Executor>) {
        let id = executor.id().to_string();
        match self.executors.get(&id) {
            Some(existing) if Arc::ptr_eq(existing, executor) => {}
            Some(_) => self.problems.push(format!("duplicate executor id '{}'", id)),
            None => {
                self.order.push(id.clone());
                self.executors.insert(id, executor.clone());
            }
        }
    }

    pub fn set_start_executor(mut self, executor: &Arc<dyn Executor>) -> Self {
        self.register(executor);
        self.start = Some(executor.id().to_string());
        self
    }

    pub fn add_executor(mut self, executor: &Arc<dyn Executor>) -> Self {
        self.register(executor);
        self
    }

    pub fn add_edge(mut self, from: &Arc<dyn Executor>, to: &Arc<dyn Executor>) -> Self {
        self.push_edge(from, to, None);
        self
    }

    pub fn add_conditional_edge(
        mut self,
        from: &Arc<dyn Executor>,
        to: &Arc<dyn Executor>,
        condition: EdgeCondition,
    ) -> Self {
        self.push_edge(from, to, Some(condition));
        self
    }

    fn push_edge(&mut self, from: &Arc<dyn Executor>, to: &Arc<dyn Executor>, condition: Option<EdgeCondition>) {
        self.register(from);
        self.register(to);
        self.edges.push(Edge {
            from: from.id().to_string(),
            to: to.id().to_string(),
            condition,
        });
    }

    pub fn max_steps(mut self, max: usize) -> Self {
        self.max_steps = max;
        self
    }

    pub fn build(self) -> Result<Workflow> {
        if let Some(problem) = self.problems.first() {
            return Err(AgentError::Workflow(problem.clone()));
        }
        let start = self
            .start
            .ok_or_else(|| AgentError::Workflow(format!("'{}' has no start executor", self.name)))?;

        Ok(Workflow {
            name: self.name,
            description: self.description,
            start,
            order: self.order,
            executors: self.executors,
            edges: self.edges,
            max_steps: self.max_steps,
        })
    }
}
