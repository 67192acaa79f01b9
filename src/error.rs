use thiserror::Error;

/// Main error type for the contract listener
#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Classification mismatch: {0}")]
    Classification(#[from] ClassificationMismatch),

    #[error("Enrichment error: {0}")]
    Enrichment(#[from] EnrichmentError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("System error: {0}")]
    System(#[from] SystemError),
}

/// JSON-RPC transport and protocol errors
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC method error: code={code}, message={message}")]
    Method { code: i64, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("HTTP status {status}")]
    Status { status: u16 },

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Batch response mismatch: expected {expected} items, got {got}")]
    BatchMismatch { expected: usize, got: usize },
}

/// A created contract that does not expose the token accessor set.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassificationMismatch {
    #[error("receipt carries no contract address")]
    NotACreation,

    #[error("contract construction reverted")]
    ConstructionFailed,

    #[error("accessor {accessor} unavailable: {reason}")]
    AccessorFailed { accessor: &'static str, reason: String },

    #[error("accessor {accessor} returned undecodable data: {reason}")]
    Undecodable { accessor: &'static str, reason: String },
}

/// Reputation or balance service failures
#[derive(Error, Debug)]
pub enum EnrichmentError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned status {0}")]
    Status(u16),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Balance lookup failed: {0}")]
    Rpc(#[from] RpcError),

    #[error("Enrichment source not configured")]
    Disabled,
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Endpoint list is empty")]
    NoEndpoints,

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    Parsing(String),

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),

    #[error("Unknown chain preset: {0}")]
    UnknownChain(String),
}

/// Display server errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Server error: {0}")]
    Server(String),
}

/// System-level errors
#[derive(Error, Debug)]
pub enum SystemError {
    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Signal handling failed: {0}")]
    Signal(String),

    #[error("HTTP client construction failed: {0}")]
    HttpClient(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ListenerError>;

/// Error severity levels for logging and monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Stops the listener
    Critical,
    /// Affects functionality until the next rotation
    High,
    /// Degrades a single tick or record
    Medium,
    /// Expected outcome, informational only
    Low,
}

impl ListenerError {
    /// Get the severity level of an error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ListenerError::Config(_) => ErrorSeverity::Critical,
            ListenerError::System(_) => ErrorSeverity::Critical,

            ListenerError::Rpc(RpcError::Connection(_)) => ErrorSeverity::High,
            ListenerError::Rpc(RpcError::Status { .. }) => ErrorSeverity::High,
            ListenerError::Api(ApiError::Server(_)) => ErrorSeverity::High,

            ListenerError::Rpc(_) => ErrorSeverity::Medium,
            ListenerError::Enrichment(_) => ErrorSeverity::Medium,
            ListenerError::Api(_) => ErrorSeverity::Medium,

            ListenerError::Classification(_) => ErrorSeverity::Low,
        }
    }

    /// Whether the poll loop should advance to the next endpoint
    pub fn triggers_rotation(&self) -> bool {
        matches!(self, ListenerError::Rpc(_))
    }

    /// Only configuration problems reach the operator
    pub fn is_fatal(&self) -> bool {
        matches!(self, ListenerError::Config(_) | ListenerError::System(_))
    }
}

impl RpcError {
    /// Classify a transport failure the way the rotation policy needs it
    pub fn from_transport(err: reqwest::Error, timeout_seconds: u64) -> Self {
        if err.is_timeout() {
            RpcError::Timeout { seconds: timeout_seconds }
        } else if err.is_connect() {
            RpcError::Connection(err.to_string())
        } else {
            RpcError::Http(err)
        }
    }
}
