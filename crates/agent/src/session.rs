//! Sessions: one conversation, one turn at a time.
//!
//! The `Orchestrator` holds everything sessions share (assembler, resolver,
//! dispatcher, registry, journal). Each `Session` owns its own bounded
//! history and handles turns through `&mut self`, so a session can never
//! run two turns at once.

use chrono::Utc;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};
use umbra_core::event::{DomainEvent, EventBus};
use umbra_core::identity::ProfileSupplier;
use umbra_core::message::{ConversationLog, DEFAULT_HISTORY_LIMIT};
use umbra_core::provider::Provider;
use umbra_core::sink::{TurnRecord, TurnSink};
use umbra_core::tool::ToolRegistry;
use uuid::Uuid;
use crate::context::ContextAssembler;
use crate::dispatcher::{DispatchResult, Dispatcher};
use crate::resolver::IntentResolver;

pub struct Orchestrator {
    assembler: ContextAssembler,
    resolver: IntentResolver,
    dispatcher: Dispatcher,
    registry: RwLock<Arc<ToolRegistry>>,
    sink: Option<Arc<dyn TurnSink>>,
    events: EventBus,
    history_limit: usize,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        profile: Arc<dyn ProfileSupplier>,
        registry: Arc<ToolRegistry>,
    ) -> Self {
        let events = EventBus::default();
        Self {
            assembler: ContextAssembler::new(profile),
            resolver: IntentResolver::new(provider, model),
            dispatcher: Dispatcher::new(events.clone()),
            registry: RwLock::new(registry),
            sink: None,
            events,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.resolver = self.resolver.with_temperature(temperature);
        self
    }

    /// Bound on one intent-service call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.resolver = self.resolver.with_timeout(timeout);
        self
    }

    /// Journal every handled turn into `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn TurnSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Use an existing bus; the dispatcher publishes on it too.
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.dispatcher = Dispatcher::new(events.clone());
        self.events = events;
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn provider_name(&self) -> &str {
        self.resolver.provider_name()
    }

    /// The registry new turns will see.
    pub fn registry(&self) -> Arc<ToolRegistry> {
        self.registry.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Swap in a rebuilt registry and drop the cached manifest.
    ///
    /// Turns already in flight keep the registry they started with.
    pub fn replace_registry(&self, registry: Arc<ToolRegistry>) {
        *self.registry.write().unwrap_or_else(|e| e.into_inner()) = registry;
        self.assembler.reload();
        info!("Tool registry replaced");
    }

    /// Re-read the profile and rebuild the manifest on the next turn.
    pub fn reload(&self) {
        self.assembler.reload();
    }

    /// Start a session with an empty history.
    pub fn session(self: &Arc<Self>) -> Session {
        Session {
            id: Uuid::new_v4().to_string(),
            history: ConversationLog::new(self.history_limit),
            orchestrator: self.clone(),
        }
    }

    async fn journal(&self, record: &TurnRecord) {
        let Some(sink) = &self.sink else {
            return;
        };
        if let Err(e) = sink.record(record).await {
            warn!(error = %e, "Failed to journal turn");
        }
    }
}

pub struct Session {
    id: String,
    history: ConversationLog,
    orchestrator: Arc<Orchestrator>,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn history(&self) -> &ConversationLog {
        &self.history
    }

    /// Handle one utterance end to end.
    ///
    /// Exactly one intent-service call and at most one tool execution. The
    /// history gains a user turn and an assistant turn only once the turn
    /// completes; dropping the future before then leaves no trace.
    pub async fn handle(&mut self, utterance: &str) -> DispatchResult {
        let orchestrator = &self.orchestrator;
        let registry = orchestrator.registry();

        let prompt = orchestrator
            .assembler
            .assemble(&registry, &self.history, utterance);
        let resolution = orchestrator.resolver.resolve(prompt).await;

        orchestrator.events.publish(DomainEvent::DecisionResolved {
            tool: resolution.decision.tool.clone(),
            arg_count: resolution.decision.args.len(),
            duration_ms: resolution.duration_ms,
            timestamp: Utc::now(),
        });
        debug!(
            session = %self.id,
            tool = %resolution.decision.tool,
            thought = resolution.decision.thought.as_deref().unwrap_or(""),
            "Decision resolved"
        );

        let result = orchestrator
            .dispatcher
            .dispatch(&registry, &resolution.decision, resolution.failure)
            .await;

        self.history.append_exchange(utterance, result.reply());

        let record = TurnRecord {
            user_text: utterance.to_string(),
            decision: resolution.decision,
            success: result.success,
            output: result.reply().to_string(),
            error: result.error.clone(),
            timestamp: Utc::now(),
        };
        orchestrator.journal(&record).await;

        result
    }
}
