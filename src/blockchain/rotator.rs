use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::ConfigError;
use crate::logging::LogContext;

/// Ordered RPC endpoints with a cyclic cursor.
///
/// `current` and `rotate` never block and never fail; an empty list is
/// rejected at construction.
#[derive(Debug)]
pub struct EndpointRotator {
    endpoints: Vec<String>,
    cursor: AtomicUsize,
}

impl EndpointRotator {
    pub fn new(endpoints: Vec<String>) -> Result<Self, ConfigError> {
        Self::starting_at(endpoints, 0)
    }

    /// Spread load across listeners by starting at a random endpoint
    pub fn with_random_start(endpoints: Vec<String>) -> Result<Self, ConfigError> {
        if endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }
        let start = rand::thread_rng().gen_range(0..endpoints.len());
        Self::starting_at(endpoints, start)
    }

    fn starting_at(endpoints: Vec<String>, start: usize) -> Result<Self, ConfigError> {
        if endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }

        let context = LogContext::new("endpoint_rotator", "initialization")
            .with_metadata("endpoint_count", serde_json::json!(endpoints.len()))
            .with_endpoint(&endpoints[start]);
        context.info("Initializing endpoint rotation");

        Ok(Self {
            endpoints,
            cursor: AtomicUsize::new(start),
        })
    }

    pub fn current(&self) -> &str {
        &self.endpoints[self.cursor.load(Ordering::Acquire)]
    }

    /// Advance the cursor `(i + 1) mod N` and return the new endpoint
    pub fn rotate(&self) -> &str {
        let len = self.endpoints.len();
        let previous = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |i| Some((i + 1) % len))
            .unwrap_or_else(|i| i);
        &self.endpoints[(previous + 1) % len]
    }

    pub fn position(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }
}
