//! Line-oriented driver
//!
//! Reads newline-delimited JSON transaction requests, submits each through the
//! intake pipeline and writes one JSON outcome per line. At end of input the
//! accepted transactions are optimized; each batch is published and written out.

use anyhow::Result;
use bytes::Bytes;
use intake_service::IntakePipeline;
use message_bus::{OrderedPublisher, PartitionKey, Topic};
use rust_decimal::Decimal;
use serde::Serialize;
use settlement::{BatchOptimizationResult, BatchOptimizer};
use std::collections::HashMap;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info, warn};
use transaction_core::{Currency, TransactionRequest, TransactionResponse};

/// Outcome of one input line
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LineOutcome {
    /// Newly accepted
    Accepted {
        /// Stored response
        response: Box<TransactionResponse>,
    },
    /// Replayed from the idempotency store
    Duplicate {
        /// Original response
        response: Box<TransactionResponse>,
    },
    /// Line is not a valid request
    Invalid {
        /// Input line number (1-based)
        line: usize,
        /// Parse error
        error: String,
    },
    /// Submission failed
    Rejected {
        /// Transaction ID
        transaction_id: String,
        /// Failure
        error: String,
        /// Whether resubmitting may succeed
        retryable: bool,
    },
}

/// Batch record written after optimization
#[derive(Debug, Serialize)]
pub struct BatchOutcome<'a> {
    /// Optimized batch
    pub batch: &'a BatchOptimizationResult,
    /// Whether the batch reached the batch topic
    pub published: bool,
}

/// Run summary
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Lines read
    pub lines: usize,
    /// New transactions accepted
    pub accepted: usize,
    /// Duplicates replayed
    pub duplicates: usize,
    /// Lines rejected or unparsable
    pub failed: usize,
    /// Batches produced
    pub batches: usize,
}

/// Driver wiring
pub struct Driver<'a> {
    /// Intake pipeline
    pub pipeline: &'a IntakePipeline,
    /// Batch optimizer
    pub optimizer: &'a BatchOptimizer,
    /// Publisher for batch results
    pub publisher: &'a dyn OrderedPublisher,
    /// Liquidity limits
    pub liquidity: Option<&'a HashMap<Currency, Decimal>>,
}

impl std::fmt::Debug for Driver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("pipeline", self.pipeline)
            .field("optimizer", self.optimizer)
            .field("liquidity", &self.liquidity)
            .finish_non_exhaustive()
    }
}

impl Driver<'_> {
    /// Process input until EOF
    pub async fn run<R, W>(&self, input: R, mut output: W) -> Result<Summary>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut summary = Summary::default();
        let mut accepted: Vec<TransactionResponse> = Vec::new();
        let mut lines = input.lines();

        while let Some(line) = lines.next_line().await? {
            summary.lines += 1;
            if line.trim().is_empty() {
                continue;
            }

            let outcome = self.submit_line(summary.lines, &line).await;
            match &outcome {
                LineOutcome::Accepted { response } => {
                    summary.accepted += 1;
                    accepted.push(response.as_ref().clone());
                }
                LineOutcome::Duplicate { .. } => summary.duplicates += 1,
                LineOutcome::Invalid { .. } | LineOutcome::Rejected { .. } => summary.failed += 1,
            }
            write_json(&mut output, &outcome).await?;
        }

        info!(
            "Input complete: {} accepted, {} duplicates, {} failed",
            summary.accepted, summary.duplicates, summary.failed
        );

        let batches = self.optimizer.optimize(&accepted, self.liquidity);
        summary.batches = batches.len();

        for batch in &batches {
            let published = self.publish_batch(batch).await;
            write_json(&mut output, &BatchOutcome { batch, published }).await?;
        }

        output.flush().await?;
        Ok(summary)
    }

    async fn submit_line(&self, line_number: usize, line: &str) -> LineOutcome {
        let request: TransactionRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                warn!("Line {}: invalid request: {}", line_number, e);
                return LineOutcome::Invalid {
                    line: line_number,
                    error: e.to_string(),
                };
            }
        };

        let transaction_id = request.transaction_id.to_string();
        match self.pipeline.submit(request).await {
            Ok((response, false)) => LineOutcome::Accepted {
                response: Box::new(response),
            },
            Ok((response, true)) => LineOutcome::Duplicate {
                response: Box::new(response),
            },
            Err(e) => LineOutcome::Rejected {
                transaction_id,
                retryable: e.is_retryable(),
                error: e.to_string(),
            },
        }
    }

    async fn publish_batch(&self, batch: &BatchOptimizationResult) -> bool {
        let payload = match serde_json::to_vec(batch) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to serialize batch {}: {}", batch.batch_id, e);
                return false;
            }
        };

        match self
            .publisher
            .publish(
                Topic::SettlementBatches,
                &PartitionKey::new(batch.batch_id.as_str()),
                Bytes::from(payload),
            )
            .await
        {
            Ok(_) => true,
            Err(e) => {
                error!("Failed to publish batch {}: {}", batch.batch_id, e);
                false
            }
        }
    }
}

async fn write_json<W, T>(output: &mut W, value: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    output.write_all(&line).await?;
    Ok(())
}
