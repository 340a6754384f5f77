//! Settlement Node
//!
//! Reads newline-delimited JSON transaction requests from stdin, admits them
//! through the intake pipeline and, at end of input, prints the optimized
//! settlement batches.
//!
//! Configuration comes from `SETTLEMENT_NODE_CONFIG` (TOML) or the environment.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, clippy::all)]

mod config;
mod driver;

use anyhow::{Context, Result};
use config::{Backend, Config, LogFormat};
use driver::{Driver, Summary};
use intake_service::{
    IdempotencyStore, InMemoryIdempotencyStore, IntakePipeline, RedisIdempotencyStore,
};
use message_bus::{InMemoryPublisher, JetStreamPublisher, OrderedPublisher};
use rust_decimal::Decimal;
use settlement::BatchOptimizer;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{self, AsyncBufRead, AsyncWrite, BufReader};
use transaction_core::Currency;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    // Logs go to stderr; stdout carries the outcome stream
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn connect(
    config: &Config,
) -> Result<(Arc<dyn IdempotencyStore>, Arc<dyn OrderedPublisher>)> {
    match config.backend {
        Backend::External => {
            let store = RedisIdempotencyStore::connect(&config.intake.redis_url)
                .await
                .context("Failed to connect to Redis")?;
            let publisher = JetStreamPublisher::connect(config.intake.publisher.clone())
                .await
                .context("Failed to connect to NATS")?;
            Ok((Arc::new(store), Arc::new(publisher)))
        }
        Backend::Memory => Ok((
            Arc::new(InMemoryIdempotencyStore::new()),
            Arc::new(InMemoryPublisher::new(config.intake.publisher.num_partitions)),
        )),
    }
}

/// Drive the input to completion, then shut the pipeline down
///
/// The pipeline is flushed even when the run fails; the run error wins.
async fn serve<R, W>(
    pipeline: IntakePipeline,
    optimizer: &BatchOptimizer,
    publisher: &dyn OrderedPublisher,
    liquidity: Option<&HashMap<Currency, Decimal>>,
    input: R,
    output: W,
) -> Result<Summary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let driver = Driver {
        pipeline: &pipeline,
        optimizer,
        publisher,
        liquidity,
    };
    let result = driver.run(input, output).await;
    let shutdown = pipeline.shutdown().await;

    let summary = result?;
    shutdown?;
    Ok(summary)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(config.log_format);

    info!(
        "Settlement node starting ({} v{})",
        config.intake.service_name, config.intake.service_version
    );

    let (store, publisher) = connect(&config).await?;
    let pipeline = IntakePipeline::new(store, publisher.clone(), config.intake.clone());
    let optimizer = BatchOptimizer::new(&config.settlement);

    let summary = serve(
        pipeline,
        &optimizer,
        publisher.as_ref(),
        config.liquidity(),
        BufReader::new(io::stdin()),
        io::stdout(),
    )
    .await?;

    info!(
        "Processed {} lines into {} batches",
        summary.lines, summary.batches
    );
    info!("Settlement node stopped");
    Ok(())
}
