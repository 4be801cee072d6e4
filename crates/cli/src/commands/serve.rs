//! `parley serve` — Start the chat page and HTTP API.

pub async fn run(host: Option<String>, port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config()?;

    if let Some(host) = host {
        config.gateway.host = host;
    }
    if let Some(port) = port {
        config.gateway.port = port;
    }

    config.require_api_key().map_err(|e| {
        super::explain_missing_key(&e);
        e
    })?;

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    println!("Parley");
    println!("   Chat page: http://{addr}/");
    println!("   Model:     {} via {}", config.provider.model, config.provider.name);
    println!("   History:   last {} tokens per request", config.trim.max_tokens);

    parley_gateway::start(config).await
}
