//! `folio serve` — Start the HTTP gateway.

use super::{Overrides, load_config, load_session};

pub async fn run(
    overrides: &Overrides,
    port: Option<u16>,
    host: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(overrides)?;
    if let Some(port) = port {
        config.gateway.port = port;
    }
    if let Some(host) = host {
        config.gateway.host = host;
    }

    let session = load_session(&config)?;

    println!("📁 Folio Gateway");
    println!("   Profile:   {}", session.profile().basics.name);
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Strategy:  {:?}", config.generation.strategy);

    folio_gateway::start(&config.gateway, session).await?;

    Ok(())
}
