//! Wire an `Orchestrator` from configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use umbra_config::AppConfig;
use umbra_core::error::Error;
use umbra_core::identity::{FileProfile, ProfilePaths};
use umbra_memory::{MemoryTurnSink, TravelStore, open_backend, pool};
use umbra_tools::{ToolDeps, default_registry};
use crate::session::Orchestrator;

/// Open the stores, build the tool registry and pick the provider.
pub async fn build(config: &AppConfig) -> Result<Arc<Orchestrator>, Error> {
    let memory = open_backend(&config.memory.backend, &config.memory_path()).await?;

    let travel_path = config.travel_db_path();
    pool::ensure_parent_dir(&travel_path)?;
    let travel = Arc::new(TravelStore::open(&travel_path.to_string_lossy()).await?);

    let registry = default_registry(ToolDeps {
        memory: memory.clone(),
        travel,
        contacts_path: config.contacts_path(),
        config: config.tools.clone(),
    })?;

    let provider = umbra_providers::build_from_config(config)?;

    let profile = FileProfile::new(ProfilePaths {
        profile_dir: Some(config.profile_dir()),
        extra_files: config.profile.extra_files.iter().map(PathBuf::from).collect(),
        override_text: config.profile.override_text.clone(),
    });

    let mut orchestrator = Orchestrator::new(
        provider,
        config.model.clone(),
        Arc::new(profile),
        Arc::new(registry),
    )
    .with_temperature(config.temperature)
    .with_timeout(Duration::from_secs(config.resolver.timeout_secs))
    .with_history_limit(config.session.history_limit);

    if config.memory.journal_turns && config.memory.backend != "none" {
        orchestrator = orchestrator.with_sink(Arc::new(MemoryTurnSink::new(memory)));
    }

    info!(
        provider = %config.provider,
        model = %config.model,
        memory = %config.memory.backend,
        tools = orchestrator.registry().len(),
        "Orchestrator ready"
    );
    Ok(Arc::new(orchestrator))
}
