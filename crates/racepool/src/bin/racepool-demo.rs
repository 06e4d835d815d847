use std::convert::Infallible;
use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;
use racepool::{OutputMode, PoolOptions, PoolOutput, Source, TaskPool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// `1000 / x`, taking as many milliseconds as the result
async fn invert(x: u64) -> Result<u64, Infallible> {
    let value = 1000 / x.max(1);
    tokio::time::sleep(Duration::from_millis(value)).await;
    Ok(value)
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Ok(path) = dotenvy::dotenv() {
        eprintln!("loaded environment from {}", path.display());
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "racepool=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let options = PoolOptions::from_env()?;
    tracing::info!(
        concurrency = options.concurrency,
        output = %options.output,
        "racepool-demo starting"
    );

    let inputs: Vec<u64> = std::env::args()
        .skip(1)
        .map(|arg| arg.parse::<u64>())
        .collect::<Result<_, _>>()?;
    let inputs = if inputs.is_empty() {
        vec![10, 25, 50]
    } else {
        inputs
    };

    let pool = TaskPool::new(options.clone());
    let ctrl_c = pool.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling run");
            ctrl_c.cancel();
        }
    });

    let results = match pool.run(invert, Source::items(inputs))? {
        PoolOutput::Stream(mut stream) => {
            let mut results = Vec::new();
            while let Some(value) = stream.next().await {
                let value = value?;
                tracing::info!(value, in_flight = stream.in_flight(), "Result arrived");
                results.push(value);
            }
            results
        }
        PoolOutput::Collect(collect) => collect.await?,
    };

    let report = serde_json::json!({
        "output": options.output,
        "concurrency": options.concurrency,
        "ordered": options.output == OutputMode::Collect,
        "results": results,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
