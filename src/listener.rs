use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::{JoinError, JoinHandle};

use crate::api::{ApiServer, AppState};
use crate::blockchain::{
    BlockProcessor, ChainClient, ContractClassifier, EndpointRotator, FailoverClient, PollLoop,
    PollLoopConfig,
};
use crate::config::AppConfig;
use crate::enrichment::{BalanceClient, EnrichmentClient, ReputationClient};
use crate::error::{ApiError, ListenerError, SystemError};
use crate::logging::{ErrorLogger, LogContext};
use crate::report::{DisplayFeed, LogSink, RecordSink};

/// A fully wired listener for one chain
pub struct Listener {
    pub poll_loop: Arc<PollLoop>,
    pub feed: Arc<DisplayFeed>,
    pub chain: Arc<dyn ChainClient>,
    config: AppConfig,
}

impl Listener {
    /// Build rotator, failover client, classifier, enrichment and poll loop.
    /// Configuration errors are the only failures surfaced here.
    pub fn from_config(config: &AppConfig) -> Result<Self, ListenerError> {
        config.validate()?;

        let endpoints = config.chain.endpoints.clone();
        let rotator = if config.polling.randomize_start_endpoint {
            EndpointRotator::with_random_start(endpoints)?
        } else {
            EndpointRotator::new(endpoints)?
        };

        let chain: Arc<dyn ChainClient> = Arc::new(FailoverClient::new(
            Arc::new(rotator),
            config.polling.rpc_timeout_seconds,
            config.polling.batch_receipts,
        )?);

        Self::with_chain(config, chain)
    }

    /// Wire the pipeline around an existing chain client
    pub fn with_chain(config: &AppConfig, chain: Arc<dyn ChainClient>) -> Result<Self, ListenerError> {
        let reputation = match &config.chain.reputation_url_template {
            Some(template) => Some(ReputationClient::new(
                template.clone(),
                config.polling.enrichment_timeout_seconds,
            )?),
            None => None,
        };
        let balance = config.polling.enrich_deployer_balance.then(|| {
            BalanceClient::new(
                Arc::clone(&chain),
                config.chain.native_decimals,
                config.chain.native_symbol.clone(),
            )
        });

        let classifier = ContractClassifier::new(
            Arc::clone(&chain),
            EnrichmentClient::new(reputation, balance),
            config.chain.name.clone(),
        );

        let feed = Arc::new(DisplayFeed::new(config.display.max_records));
        let sinks: Vec<Arc<dyn RecordSink>> = vec![Arc::new(LogSink), feed.clone()];
        let processor = BlockProcessor::new(Arc::clone(&chain), classifier, sinks);

        let poll_loop = Arc::new(PollLoop::new(
            Arc::clone(&chain),
            processor,
            PollLoopConfig::from(&config.polling),
        ));

        Ok(Self {
            poll_loop,
            feed,
            chain,
            config: config.clone(),
        })
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            feed: Arc::clone(&self.feed),
            control: self.poll_loop.handle(),
            chain_name: self.config.chain.name.clone(),
        }
    }

    /// Poll (and serve the display page) until Ctrl-C or a server failure
    pub async fn run(self) -> Result<(), ListenerError> {
        let context = LogContext::new("listener", "run")
            .with_metadata("chain", serde_json::json!(self.config.chain.name))
            .with_metadata("endpoint_count", serde_json::json!(self.config.chain.endpoints.len()))
            .with_endpoint(&self.chain.current_endpoint());
        context.info("Starting contract listener");

        let poll = Arc::clone(&self.poll_loop);
        let poll_task = tokio::spawn(async move { poll.run().await });

        let server_shutdown = Arc::new(Notify::new());
        let mut server_task = if self.config.display.enabled {
            let server = ApiServer::new(
                self.app_state(),
                self.config.display.host.clone(),
                self.config.display.port,
            );
            let notify = Arc::clone(&server_shutdown);
            Some(tokio::spawn(async move {
                server.start(async move { notify.notified().await }).await
            }))
        } else {
            None
        };

        let result = tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.map_err(|e| ListenerError::from(SystemError::Signal(e.to_string())))
            }
            served = join_server(&mut server_task) => served,
        };

        LogContext::new("listener", "shutdown").info("Shutting down");
        self.poll_loop.shutdown();
        server_shutdown.notify_one();

        if let Some(handle) = server_task {
            if let Err(e) = flatten(handle.await) {
                ErrorLogger::log_error(&e, Some(LogContext::new("listener", "server_shutdown")));
            }
        }
        if let Err(e) = poll_task.await {
            let error = ListenerError::from(SystemError::Signal(format!("poll task failed: {}", e)));
            ErrorLogger::log_error(&error, Some(LogContext::new("listener", "poll_shutdown")));
        }

        result
    }
}

/// Resolves when the display server stops; never resolves without one
async fn join_server(task: &mut Option<JoinHandle<Result<(), ApiError>>>) -> Result<(), ListenerError> {
    match task.as_mut() {
        Some(handle) => {
            let joined = handle.await;
            *task = None;
            flatten(joined)
        }
        None => std::future::pending().await,
    }
}

fn flatten(joined: Result<Result<(), ApiError>, JoinError>) -> Result<(), ListenerError> {
    match joined {
        Ok(served) => served.map_err(ListenerError::from),
        Err(e) => Err(ApiError::Server(format!("display server task failed: {}", e)).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn test_empty_endpoints_fail_fast() {
        let mut config = AppConfig::default();
        config.chain.endpoints.clear();

        assert!(matches!(
            Listener::from_config(&config),
            Err(ListenerError::Config(ConfigError::NoEndpoints))
        ));
    }

    #[tokio::test]
    async fn test_wiring_from_defaults() {
        let config = AppConfig::default();
        let listener = Listener::from_config(&config).unwrap();

        assert_eq!(listener.chain.current_endpoint(), "https://mainnet.base.org");
        assert_eq!(listener.feed.capacity(), config.display.max_records);

        let state = listener.app_state();
        assert_eq!(state.chain_name, "base");
        assert!(state.control.is_enabled());
        assert_eq!(listener.poll_loop.last_processed(), None);
    }
}
