//! Primary command - runs a primary node.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use beryl_client::HttpReplicaTransport;
use beryl_config::PrimaryConfig;
use beryl_replication::{Primary, PrimaryOptions};
use beryl_server::primary::router;

pub async fn run(
    host: Option<String>,
    port: Option<u16>,
    secondaries: Option<String>,
) -> Result<()> {
    let mut config = PrimaryConfig::from_env()?;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(secondaries) = secondaries {
        config.secondaries = secondaries;
    }
    crate::init_tracing(&config.log_level);

    let replicas = config.secondary_addrs();
    println!();
    println!("Beryl primary");
    println!();
    println!("  Bind address: {}", config.listen_addr());
    println!("  Secondaries:  {}", replicas.len());
    for replica in &replicas {
        println!("    - {replica}");
    }
    println!();

    let options = PrimaryOptions {
        health_interval: config.health_interval(),
        health_grace: config.health_grace(),
        ..Default::default()
    };
    let node = Primary::spawn(replicas, Arc::new(HttpReplicaTransport::new()), options);

    let listener = beryl_server::bind(&config.listen_addr()).await?;
    info!("primary ready");
    beryl_server::serve(listener, router(node)).await?;
    Ok(())
}
