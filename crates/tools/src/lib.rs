//! Built-in tools for Umbra.
//!
//! Each tool is a small `Tool` impl over one capability: external APIs
//! (weather, search, quotes, routes), long-term memory, the address book
//! and the travel store. `default_registry` wires them all into a frozen
//! `ToolRegistry`.

mod http;

pub mod contacts;
pub mod memory_log;
pub mod memory_search;
pub mod quote;
pub mod route;
pub mod travel;
pub mod weather;
pub mod web_search;

use std::path::PathBuf;
use std::sync::Arc;
use umbra_config::ToolsConfig;
use umbra_core::error::RegistryError;
use umbra_core::memory::MemoryBackend;
use umbra_core::tool::ToolRegistry;
use umbra_memory::TravelStore;

pub use contacts::ContactsTool;
pub use memory_log::LogTool;
pub use memory_search::RecallTool;
pub use quote::QuoteTool;
pub use route::DistanceTool;
pub use travel::{AddFriendTool, AddPoiTool, ListFriendsTool, UpdateFriendTool};
pub use weather::WeatherTool;
pub use web_search::{SearchTool, TavilyClient};

/// Everything the built-in tools need from the outside world.
pub struct ToolDeps {
    pub memory: Arc<dyn MemoryBackend>,
    pub travel: Arc<TravelStore>,
    pub contacts_path: PathBuf,
    pub config: ToolsConfig,
}

/// Build the registry of every built-in tool.
///
/// Tools whose API key is missing are still registered; they report
/// `NotConfigured` when run.
pub fn default_registry(deps: ToolDeps) -> Result<ToolRegistry, RegistryError> {
    let ToolDeps {
        memory,
        travel,
        contacts_path,
        config,
    } = deps;
    let tavily = Arc::new(TavilyClient::new(config.search_api_key.clone()));

    let mut builder = ToolRegistry::builder();
    builder
        .register_tool(WeatherTool::new(
            config.weather_api_key.clone(),
            &config.default_city,
            &config.default_country,
            config.units.clone(),
        ))?
        .register_tool(SearchTool::new(tavily.clone()))?
        .register_tool(QuoteTool::new(tavily, config.inspirational_sources.clone()))?
        .register_tool(DistanceTool::new(config.maps_api_key.clone()))?
        .register_tool(LogTool::new(memory.clone()))?
        .register_tool(RecallTool::new(memory))?
        .register_tool(ContactsTool::new(contacts_path))?
        .register_tool(AddFriendTool::new(travel.clone()))?
        .register_tool(AddPoiTool::new(travel.clone()))?
        .register_tool(UpdateFriendTool::new(travel.clone()))?
        .register_tool(ListFriendsTool::new(travel))?;
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::tool::Arity;
    use umbra_memory::InMemoryBackend;

    async fn registry() -> ToolRegistry {
        default_registry(ToolDeps {
            memory: Arc::new(InMemoryBackend::new()),
            travel: Arc::new(TravelStore::open("sqlite::memory:").await.unwrap()),
            contacts_path: PathBuf::from("contacts.csv"),
            config: ToolsConfig::default(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn registers_every_builtin() {
        let registry = registry().await;
        assert_eq!(
            registry.names(),
            vec![
                "add-friend",
                "add-poi",
                "check-contacts",
                "distance",
                "list-friends",
                "log",
                "quote",
                "recall",
                "search",
                "update-friend",
                "weather",
            ]
        );
    }

    #[tokio::test]
    async fn arities_match_tool_contracts() {
        let registry = registry().await;
        let arity = |name: &str| registry.lookup(name).unwrap().arity;
        assert_eq!(arity("add-poi"), Arity::Exact(4));
        assert_eq!(arity("add-friend"), Arity::Exact(3));
        assert_eq!(arity("distance"), Arity::Exact(2));
        assert_eq!(arity("weather"), Arity::Exact(1));
        assert_eq!(arity("quote"), Arity::Exact(0));
        assert_eq!(arity("list-friends"), Arity::Exact(0));
    }

    #[tokio::test]
    async fn log_then_recall_through_the_registry() {
        let registry = registry().await;
        registry
            .lookup("log")
            .unwrap()
            .invoke(vec!["Dentist on Friday".into()])
            .await
            .unwrap();
        let out = registry
            .lookup("recall")
            .unwrap()
            .invoke(vec!["dentist".into()])
            .await
            .unwrap()
            .unwrap();
        assert!(out.starts_with("Found 1 memories containing 'dentist':"));
    }
}
