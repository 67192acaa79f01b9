use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::time::{interval, MissedTickBehavior};
use log::{debug, info, trace};

use crate::blockchain::{BlockProcessor, ChainClient, ProcessError};
use crate::config::PollingConfig;
use crate::error::{ListenerError, RpcError};
use crate::logging::{ErrorLogger, LogContext, MetricsLogger};

pub struct PollLoopConfig {
    pub poll_interval_ms: u64,
    /// Process the first observed height instead of adopting it as baseline
    pub process_first_block: bool,
}

impl Default for PollLoopConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            process_first_block: false,
        }
    }
}

impl From<&PollingConfig> for PollLoopConfig {
    fn from(polling: &PollingConfig) -> Self {
        Self {
            poll_interval_ms: polling.poll_interval_ms,
            process_first_block: polling.process_first_block,
        }
    }
}

/// What a single tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Polling is switched off
    Disabled,
    /// Another tick is still processing
    Busy,
    /// First observed height recorded without processing
    Baseline { height: u64 },
    /// Height check failed; the endpoint was rotated
    HeightUnavailable { reason: String },
    /// Latest height is not above the last processed block
    NoProgress { height: u64 },
    Processed { block_number: u64, tokens: usize },
    /// Block was claimed but could not be processed; it is not retried
    BlockSkipped { block_number: u64, reason: String },
}

impl TickOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            TickOutcome::Disabled => "disabled",
            TickOutcome::Busy => "busy",
            TickOutcome::Baseline { .. } => "baseline",
            TickOutcome::HeightUnavailable { .. } => "height_unavailable",
            TickOutcome::NoProgress { .. } => "no_progress",
            TickOutcome::Processed { .. } => "processed",
            TickOutcome::BlockSkipped { .. } => "block_skipped",
        }
    }

    /// Block the tick acted on, if any
    pub fn block_number(&self) -> Option<u64> {
        match self {
            TickOutcome::Baseline { height } | TickOutcome::NoProgress { height } => Some(*height),
            TickOutcome::Processed { block_number, .. } | TickOutcome::BlockSkipped { block_number, .. } => {
                Some(*block_number)
            }
            _ => None,
        }
    }
}

/// Mutable poll state shared between the loop and its handles
#[derive(Default)]
pub struct PollState {
    enabled: AtomicBool,
    processing: AtomicBool,
    last_processed: Mutex<Option<u64>>,
    ticks: AtomicU64,
    blocks_processed: AtomicU64,
    blocks_skipped: AtomicU64,
    rotations: AtomicU64,
    tokens_detected: AtomicU64,
}

impl PollState {
    fn new(enabled: bool) -> Self {
        let state = Self::default();
        state.enabled.store(enabled, Ordering::Release);
        state
    }

    fn last_processed(&self) -> MutexGuard<'_, Option<u64>> {
        match self.last_processed.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Clears the processing flag when the tick ends, whatever path it takes
struct ProcessingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ProcessingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollStatus {
    pub enabled: bool,
    pub processing: bool,
    pub last_processed_block: Option<u64>,
    pub ticks: u64,
    pub blocks_processed: u64,
    pub blocks_skipped: u64,
    pub rotations: u64,
    pub tokens_detected: u64,
    pub current_endpoint: String,
}

/// On/off control and status for a running `PollLoop`
#[derive(Clone)]
pub struct PollHandle {
    state: Arc<PollState>,
    chain: Arc<dyn ChainClient>,
}

impl PollHandle {
    pub fn start(&self) {
        self.set_enabled(true);
    }

    pub fn stop(&self) {
        self.set_enabled(false);
    }

    /// Takes effect between ticks; a tick in flight completes
    pub fn set_enabled(&self, enabled: bool) {
        let previous = self.state.enabled.swap(enabled, Ordering::AcqRel);
        if previous != enabled {
            let context = LogContext::new("poll_loop", "toggle")
                .with_metadata("enabled", serde_json::json!(enabled));
            context.info(if enabled { "Polling enabled" } else { "Polling disabled" });
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled.load(Ordering::Acquire)
    }

    pub fn status(&self) -> PollStatus {
        let state = &self.state;
        PollStatus {
            enabled: state.enabled.load(Ordering::Acquire),
            processing: state.processing.load(Ordering::Acquire),
            last_processed_block: *state.last_processed(),
            ticks: state.ticks.load(Ordering::Relaxed),
            blocks_processed: state.blocks_processed.load(Ordering::Relaxed),
            blocks_skipped: state.blocks_skipped.load(Ordering::Relaxed),
            rotations: state.rotations.load(Ordering::Relaxed),
            tokens_detected: state.tokens_detected.load(Ordering::Relaxed),
            current_endpoint: self.chain.current_endpoint(),
        }
    }
}

enum Claim {
    Baseline,
    NoProgress,
    Process,
}

/// Periodically checks the chain head and processes each new head block
/// at most once
pub struct PollLoop {
    chain: Arc<dyn ChainClient>,
    processor: BlockProcessor,
    config: PollLoopConfig,
    state: Arc<PollState>,
    pub shutdown_signal: Arc<AtomicBool>,
    shutdown_notify: Notify,
}

impl PollLoop {
    pub fn new(chain: Arc<dyn ChainClient>, processor: BlockProcessor, config: PollLoopConfig) -> Self {
        Self {
            chain,
            processor,
            config,
            state: Arc::new(PollState::new(true)),
            shutdown_signal: Arc::new(AtomicBool::new(false)),
            shutdown_notify: Notify::new(),
        }
    }

    pub fn handle(&self) -> PollHandle {
        PollHandle {
            state: Arc::clone(&self.state),
            chain: Arc::clone(&self.chain),
        }
    }

    pub fn status(&self) -> PollStatus {
        self.handle().status()
    }

    pub fn last_processed(&self) -> Option<u64> {
        *self.state.last_processed()
    }

    /// One poll step: height check, progress detection, block processing
    pub async fn tick(&self) -> TickOutcome {
        if !self.state.enabled.load(Ordering::Acquire) {
            return TickOutcome::Disabled;
        }

        let _guard = match ProcessingGuard::acquire(&self.state.processing) {
            Some(guard) => guard,
            None => return TickOutcome::Busy,
        };
        self.state.ticks.fetch_add(1, Ordering::Relaxed);

        let height = match self.chain.latest_block_height().await {
            Ok(height) => height,
            Err(e) => {
                let reason = e.to_string();
                self.rotate_after(e, None);
                return TickOutcome::HeightUnavailable { reason };
            }
        };

        // Claimed before processing; a failed block is never retried
        let claim = {
            let mut last = self.state.last_processed();
            match *last {
                None if !self.config.process_first_block => {
                    *last = Some(height);
                    Claim::Baseline
                }
                Some(previous) if height <= previous => Claim::NoProgress,
                _ => {
                    *last = Some(height);
                    Claim::Process
                }
            }
        };

        match claim {
            Claim::Baseline => {
                let context = LogContext::new("poll_loop", "baseline")
                    .with_block_number(height)
                    .with_endpoint(&self.chain.current_endpoint());
                context.info(&format!("Starting from current head {}", height));
                TickOutcome::Baseline { height }
            }
            Claim::NoProgress => TickOutcome::NoProgress { height },
            Claim::Process => self.process(height).await,
        }
    }

    async fn process(&self, height: u64) -> TickOutcome {
        match self.processor.process_block(height).await {
            Ok(outcome) => {
                self.state.blocks_processed.fetch_add(1, Ordering::Relaxed);
                self.state
                    .tokens_detected
                    .fetch_add(outcome.tokens.len() as u64, Ordering::Relaxed);
                TickOutcome::Processed {
                    block_number: height,
                    tokens: outcome.tokens.len(),
                }
            }
            Err(e) => {
                self.state.blocks_skipped.fetch_add(1, Ordering::Relaxed);
                let reason = e.to_string();
                match e {
                    ProcessError::Rpc(rpc) => self.rotate_after(rpc, Some(height)),
                    unavailable => {
                        let context = LogContext::new("poll_loop", "process_block")
                            .with_block_number(height)
                            .with_endpoint(&self.chain.current_endpoint());
                        context.warn(&format!("Skipping block: {}", unavailable));
                    }
                }
                TickOutcome::BlockSkipped {
                    block_number: height,
                    reason,
                }
            }
        }
    }

    fn rotate_after(&self, error: RpcError, block_number: Option<u64>) {
        let mut context = LogContext::new("poll_loop", "rpc_failure")
            .with_endpoint(&self.chain.current_endpoint());
        if let Some(block_number) = block_number {
            context = context.with_block_number(block_number);
        }
        ErrorLogger::log_error(&ListenerError::Rpc(error), Some(context));

        self.chain.rotate_endpoint();
        self.state.rotations.fetch_add(1, Ordering::Relaxed);
    }

    /// Tick on a fixed interval until `shutdown` is requested
    pub async fn run(&self) {
        info!(
            "Starting poll loop with {}ms interval on {}",
            self.config.poll_interval_ms,
            self.chain.current_endpoint()
        );

        let mut ticker = interval(Duration::from_millis(self.config.poll_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if self.shutdown_signal.load(Ordering::Relaxed) {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.shutdown_notify.notified() => break,
            }

            if self.shutdown_signal.load(Ordering::Relaxed) {
                break;
            }

            let started = Instant::now();
            let outcome = self.tick().await;
            MetricsLogger::log_tick(
                outcome.label(),
                outcome.block_number(),
                started.elapsed().as_millis() as u64,
            );

            match outcome {
                TickOutcome::Processed { block_number, tokens } => {
                    debug!("Processed block {} ({} tokens)", block_number, tokens);
                }
                TickOutcome::BlockSkipped { block_number, reason } => {
                    debug!("Skipped block {}: {}", block_number, reason);
                }
                other => trace!("Tick outcome: {:?}", other),
            }
        }

        info!("Poll loop stopped");
    }

    /// Request graceful shutdown; takes effect between ticks
    pub fn shutdown(&self) {
        info!("Requesting poll loop shutdown");
        self.shutdown_signal.store(true, Ordering::Relaxed);
        self.shutdown_notify.notify_one();
    }
}
