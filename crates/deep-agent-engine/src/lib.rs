//! Execution engine: Anthropic streaming, the tool loop, and sub-agent
//! delegation.
//!
//! One [`DeepAgentEngine`] is built at process start and shared across
//! requests; each request gets a fresh [`ToolContext`] and its own raw
//! event stream.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{error, info};

use deep_agent_core::config::Config;
use deep_agent_core::engine::{ExecutionEngine, RunEventStream};
use deep_agent_core::error::DeepAgentError;
use deep_agent_core::types::{ChatMessage, ContentBlock, Role, TranscriptEntry};
use deep_agent_tools::{register_builtin_tools, ToolContext, ToolRegistry};

pub mod prompt;
pub mod provider;
pub mod runtime;
pub mod sse;

pub use provider::{AnthropicProvider, CompletionChunk, CompletionRequest, ModelProvider};
pub use runtime::SubAgent;

use runtime::AgentRunner;

pub struct DeepAgentEngine {
    config: Arc<Config>,
    provider: Arc<dyn ModelProvider>,
    registry: Arc<ToolRegistry>,
    subagents: Vec<SubAgent>,
}

impl DeepAgentEngine {
    /// Build the engine against the real Anthropic API.
    pub fn new(config: Arc<Config>) -> deep_agent_core::error::Result<Self> {
        let api_key = config.anthropic_api_key().ok_or_else(|| {
            DeepAgentError::Config(
                "no Anthropic API key configured (set ANTHROPIC_API_KEY)".to_string(),
            )
        })?;
        let provider = Arc::new(AnthropicProvider::new(
            api_key,
            config.model_base_url().as_deref(),
        ));
        Ok(Self::with_provider(config, provider))
    }

    /// Build the engine with an explicit provider. Used by tests to run
    /// the loop against a scripted model.
    pub fn with_provider(config: Arc<Config>, provider: Arc<dyn ModelProvider>) -> Self {
        let mut registry = ToolRegistry::new();
        register_builtin_tools(&mut registry);

        let subagents = vec![SubAgent {
            name: "research-agent".to_string(),
            description: "Delegate research to the sub-agent researcher. Only give this researcher one topic at a time.".to_string(),
            prompt: prompt::researcher_prompt(),
            tools: vec!["tavily_search".to_string(), "think_tool".to_string()],
        }];

        info!(tools = ?registry.list(), "engine initialized");

        Self {
            config,
            provider,
            registry: Arc::new(registry),
            subagents,
        }
    }

    fn runner(&self) -> AgentRunner {
        AgentRunner {
            provider: Arc::clone(&self.provider),
            registry: Arc::clone(&self.registry),
            subagents: self.subagents.clone(),
            config: Arc::clone(&self.config),
        }
    }

    /// Split incoming chat messages into the system prompt and the
    /// conversation transcript. System messages are appended after the
    /// built-in orchestrator instructions.
    fn prepare(&self, messages: Vec<ChatMessage>) -> (String, Vec<TranscriptEntry>) {
        let mut system = prompt::orchestrator_prompt();
        let mut transcript = Vec::new();

        for message in messages {
            match message.role {
                Role::System => {
                    system.push_str("\n\n");
                    system.push_str(&message.content);
                }
                Role::User => transcript.push(TranscriptEntry::User {
                    content: vec![ContentBlock::Text {
                        text: message.content,
                    }],
                }),
                Role::Assistant => transcript.push(TranscriptEntry::Assistant {
                    content: vec![ContentBlock::Text {
                        text: message.content,
                    }],
                }),
            }
        }

        (system, transcript)
    }
}

#[async_trait]
impl ExecutionEngine for DeepAgentEngine {
    fn stream(&self, messages: Vec<ChatMessage>) -> RunEventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let (system, transcript) = self.prepare(messages);
        let runner = self.runner();
        let context = ToolContext::new(Arc::clone(&self.config));

        tokio::spawn(async move {
            if let Err(e) = runner
                .run(&context, &system, None, true, transcript, &tx)
                .await
            {
                error!(%e, "agent run failed");
                let _ = tx.send(Err(e));
            }
        });

        Box::pin(UnboundedReceiverStream::new(rx))
    }

    async fn invoke(&self, messages: Vec<ChatMessage>) -> anyhow::Result<String> {
        // Nothing consumes intermediate events on this path, but the
        // receiver must stay alive for the run's duration or the runner
        // treats the request as abandoned.
        let (tx, _rx) = mpsc::unbounded_channel();
        let (system, transcript) = self.prepare(messages);
        let context = ToolContext::new(Arc::clone(&self.config));
        self.runner()
            .run(&context, &system, None, true, transcript, &tx)
            .await
    }
}
