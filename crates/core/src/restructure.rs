//! Chunked restructuring with rate-limit-aware retry.
//!
//! Fragments from all records are flattened and split into fixed-size chunks.
//! Each chunk goes through the restructuring service on its own, strictly one
//! after another. A rate-limited chunk is retried with exponential backoff; any
//! other failure, or running out of attempts, skips the chunk and the run moves
//! on to the next one.

use crate::types::{Record, RestructuredSection};
use std::time::Duration;
use thiserror::Error;

/// Default number of fragments sent per request.
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Default number of attempts per chunk.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Errors reported by a restructuring service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RestructureError {
    /// The service asked us to slow down. Retryable.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Any other failure. Not retried.
    #[error("restructuring failed: {0}")]
    Failed(String),
}

/// A service that turns a batch of text fragments into one titled section.
pub trait Restructurer {
    fn restructure(&self, fragments: &[String]) -> Result<RestructuredSection, RestructureError>;
}

/// Waits between attempts.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeps on the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts per chunk.
    pub max_retries: u32,
    /// Delay after the first rate-limited attempt; doubles per attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Delay after rate-limited attempt `attempt` (0-indexed).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Lifecycle of one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkState {
    Pending,
    InFlight { attempt: u32 },
    RateLimited { attempt: u32 },
    Backoff { attempt: u32, delay: Duration },
    Success(RestructuredSection),
    Skipped { reason: String },
}

impl ChunkState {
    /// Whether the chunk has finished processing.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChunkState::Success(_) | ChunkState::Skipped { .. })
    }
}

/// Outcome of one chunk after all attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkReport {
    /// Position of the chunk in the run.
    pub index: usize,
    /// Number of fragments in the chunk.
    pub fragments: usize,
    /// Number of requests made.
    pub attempts: u32,
    /// Terminal state: `Success` or `Skipped`.
    pub state: ChunkState,
}

/// Drives chunks through a [`Restructurer`] one at a time.
pub struct ChunkOrchestrator<R, S = ThreadSleeper> {
    restructurer: R,
    sleeper: S,
    chunk_size: usize,
    policy: RetryPolicy,
}

impl<R: Restructurer> ChunkOrchestrator<R, ThreadSleeper> {
    /// Create an orchestrator with default chunk size and retry policy.
    pub fn new(restructurer: R) -> Self {
        Self {
            restructurer,
            sleeper: ThreadSleeper,
            chunk_size: DEFAULT_CHUNK_SIZE,
            policy: RetryPolicy::default(),
        }
    }
}

impl<R: Restructurer, S: Sleeper> ChunkOrchestrator<R, S> {
    /// Set the number of fragments per chunk.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1); // At least 1 fragment per chunk
        self
    }

    /// Set the retry policy. A chunk always gets at least one attempt.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = RetryPolicy {
            max_retries: policy.max_retries.max(1),
            ..policy
        };
        self
    }

    /// Replace the sleeper used for backoff.
    pub fn with_sleeper<T: Sleeper>(self, sleeper: T) -> ChunkOrchestrator<R, T> {
        ChunkOrchestrator {
            restructurer: self.restructurer,
            sleeper,
            chunk_size: self.chunk_size,
            policy: self.policy,
        }
    }

    /// Restructure all records, returning the sections of successful chunks
    /// in chunk order.
    pub fn run(&self, records: &[Record]) -> Vec<RestructuredSection> {
        self.run_with_report(records)
            .into_iter()
            .filter_map(|report| match report.state {
                ChunkState::Success(section) => Some(section),
                _ => None,
            })
            .collect()
    }

    /// Restructure all records and report the outcome of every chunk.
    pub fn run_with_report(&self, records: &[Record]) -> Vec<ChunkReport> {
        let fragments: Vec<String> = records
            .iter()
            .flat_map(|record| record.texts.iter().cloned())
            .collect();

        let reports: Vec<ChunkReport> = fragments
            .chunks(self.chunk_size)
            .enumerate()
            .map(|(index, chunk)| self.process_chunk(index, chunk))
            .collect();

        let succeeded = reports
            .iter()
            .filter(|r| matches!(r.state, ChunkState::Success(_)))
            .count();
        log::info!(
            "[Success] Finished processing {} chunks ({} succeeded, {} skipped)",
            reports.len(),
            succeeded,
            reports.len() - succeeded
        );

        reports
    }

    /// Run one chunk to a terminal state.
    pub fn process_chunk(&self, index: usize, chunk: &[String]) -> ChunkReport {
        log::info!(
            "[Processing] Chunk {} with {} fragments",
            index,
            chunk.len()
        );

        let mut attempts = 0;
        let mut state = ChunkState::Pending;

        while !state.is_terminal() {
            state = match state {
                ChunkState::Pending => ChunkState::InFlight { attempt: 0 },
                ChunkState::InFlight { attempt } => {
                    attempts += 1;
                    match self.restructurer.restructure(chunk) {
                        Ok(section) => ChunkState::Success(section),
                        Err(RestructureError::RateLimited(msg)) => {
                            log::debug!("Chunk {} rate limited: {}", index, msg);
                            ChunkState::RateLimited { attempt }
                        }
                        Err(RestructureError::Failed(msg)) => ChunkState::Skipped {
                            reason: format!("restructuring failed: {}", msg),
                        },
                    }
                }
                ChunkState::RateLimited { attempt } if attempt + 1 < self.policy.max_retries => {
                    ChunkState::Backoff {
                        attempt,
                        delay: self.policy.delay_for(attempt),
                    }
                }
                ChunkState::RateLimited { .. } => ChunkState::Skipped {
                    reason: format!(
                        "failed to process chunk after {} retries",
                        self.policy.max_retries
                    ),
                },
                ChunkState::Backoff { attempt, delay } => {
                    log::warn!(
                        "[Rate Limit] Retrying in {}ms... (Attempt {} of {})",
                        delay.as_millis(),
                        attempt + 1,
                        self.policy.max_retries
                    );
                    self.sleeper.sleep(delay);
                    ChunkState::InFlight {
                        attempt: attempt + 1,
                    }
                }
                terminal => terminal,
            };
        }

        if let ChunkState::Skipped { reason } = &state {
            log::warn!("[Error] Skipping chunk {}: {}", index, reason);
        }

        ChunkReport {
            index,
            fragments: chunk.len(),
            attempts,
            state,
        }
    }
}
