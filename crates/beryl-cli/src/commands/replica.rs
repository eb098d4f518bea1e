//! Replica command - runs a replica node.

use anyhow::Result;
use tracing::info;

use beryl_config::ReplicaConfig;
use beryl_server::ReplicaState;
use beryl_server::replica::router;

pub async fn run(host: Option<String>, port: Option<u16>, delay_ms: Option<u64>) -> Result<()> {
    let mut config = ReplicaConfig::from_env()?;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(delay_ms) = delay_ms {
        config.delay_ms = delay_ms;
    }
    crate::init_tracing(&config.log_level);

    println!();
    println!("Beryl replica");
    println!();
    println!("  Bind address:  {}", config.listen_addr());
    println!("  Ingress delay: {}ms", config.delay_ms);
    println!();

    let state = ReplicaState::new(config.ingress_delay());
    let listener = beryl_server::bind(&config.listen_addr()).await?;
    info!("replica ready");
    beryl_server::serve(listener, router(state)).await?;
    Ok(())
}
