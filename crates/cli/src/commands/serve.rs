//! `umbra serve`: start the HTTP chat gateway.

use umbra_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Umbra Gateway");
    println!("   Listening: http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Routes:    GET /status, POST /chat");

    umbra_gateway::start(config).await?;

    Ok(())
}
