//! `umbra tools`: list the registered tools and whether they are ready.

use umbra_config::AppConfig;

/// Tools that need an API key, with the config field that holds it.
fn missing_key(tool: &str, config: &AppConfig) -> Option<&'static str> {
    let tools = &config.tools;
    match tool {
        "weather" if tools.weather_api_key.is_none() => Some("tools.weather_api_key / OPENWEATHER_API_KEY"),
        "search" | "quote" if tools.search_api_key.is_none() => Some("tools.search_api_key / TAVILY_API_KEY"),
        "distance" if tools.maps_api_key.is_none() => Some("tools.maps_api_key / MAPS_API_KEY"),
        _ => None,
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let orchestrator = umbra_agent::bootstrap::build(&config).await?;
    let registry = orchestrator.registry();

    println!("Umbra Tools ({})", registry.len());
    println!();
    for descriptor in registry.descriptors() {
        println!("  {}", descriptor.manifest_line());
        if let Some(key) = missing_key(&descriptor.name, &config) {
            println!("      not configured: set {key}");
        }
    }
    println!();
    println!("  Reserved: conversation, error");

    Ok(())
}
