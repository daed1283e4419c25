//! Pushes synthetic jobs onto a Redis list so a `GeneralScaler` bound to a
//! redis-type metric has something to react to. Not part of the operator
//! proper — an operational convenience for demoing the Redis queue provider.

use std::time::Duration;

use anyhow::{Context, Result};
use redis::AsyncCommands;

pub async fn run(host: String, port: u16, queue: String, count: u32, rate: u32) -> Result<()> {
    println!("Load generator");
    println!("Target: {host}:{port}, queue: {queue}");
    println!("Adding {count} items at {rate}/second");
    println!("{}", "-".repeat(60));

    let client = redis::Client::open(format!("redis://{host}:{port}"))
        .context("invalid redis connection string")?;
    let mut conn = client
        .get_multiplexed_async_connection()
        .await
        .context("failed to connect to redis")?;

    let initial_length: i64 = conn.llen(&queue).await.context("failed to read queue length")?;
    println!("Initial queue length: {initial_length}");

    let delay = Duration::from_secs_f64(1.0 / rate.max(1) as f64);

    for i in 0..count {
        let item = format!("job-{}-{i}", chrono::Utc::now().timestamp());
        conn.rpush::<_, _, ()>(&queue, &item).await.context("failed to push job")?;
        let current_length: i64 = conn.llen(&queue).await.context("failed to read queue length")?;
        println!("  [{}/{count}] added '{item}' | queue length: {current_length}", i + 1);

        if i + 1 < count {
            tokio::time::sleep(delay).await;
        }
    }

    let final_length: i64 = conn.llen(&queue).await.context("failed to read queue length")?;
    println!("{}", "-".repeat(60));
    println!("Done. Queue length: {initial_length} -> {final_length}");

    Ok(())
}
