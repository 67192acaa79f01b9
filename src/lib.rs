pub mod api;
pub mod blockchain;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod listener;
pub mod logging;
pub mod models;
pub mod report;

pub use blockchain::{ChainClient, EndpointRotator, FailoverClient, PollLoop, RpcClient, TickOutcome};
pub use config::{AppConfig, ChainConfig, DisplayConfig, LoggingConfig, PollingConfig};
pub use error::{ClassificationMismatch, ConfigError, EnrichmentError, ListenerError, Result, RpcError};
pub use listener::Listener;
pub use logging::{ErrorLogger, LogContext, MetricsLogger, PerformanceMonitor};
pub use models::{Enriched, TokenRecord, TransactionRecord};
pub use report::{DisplayFeed, LogSink, RecordSink};
