//! Append command - submits one message through a primary.

use anyhow::Result;

use beryl_client::BerylClient;

pub async fn run(msg: &str, server: &str, w: Option<u32>) -> Result<()> {
    let client = BerylClient::new(server);
    let response = client.append(msg, w).await?;

    println!(
        "appended seq={} w={} acks={} duration_ms={}",
        response.seq,
        response.w,
        response.acks.len(),
        response.duration_ms
    );
    for ack in &response.acks {
        println!("  acked by {}", ack.secondary);
    }
    Ok(())
}
