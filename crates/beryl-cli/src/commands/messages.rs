//! Messages command - prints a node's visible log.

use anyhow::Result;

use beryl_client::BerylClient;

pub async fn run(server: &str) -> Result<()> {
    let client = BerylClient::new(server);
    let messages = client.messages().await?;

    if messages.is_empty() {
        println!("(empty log)");
        return Ok(());
    }
    for (position, message) in messages.iter().enumerate() {
        println!("{:>6}  {message}", position + 1);
    }
    Ok(())
}
