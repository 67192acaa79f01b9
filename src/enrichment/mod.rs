pub mod balance;
pub mod reputation;

pub use balance::BalanceClient;
pub use reputation::ReputationClient;

use crate::error::{EnrichmentError, ListenerError};
use crate::logging::{ErrorLogger, LogContext};
use crate::models::{Enriched, NativeBalance, ReputationReport};

/// Decorates token records with reputation and deployer balance.
///
/// Every failure is absorbed into `Enriched::Unavailable`; a missing
/// source yields `Enriched::Disabled`.
#[derive(Clone, Default)]
pub struct EnrichmentClient {
    reputation: Option<ReputationClient>,
    balance: Option<BalanceClient>,
}

impl EnrichmentClient {
    pub fn new(reputation: Option<ReputationClient>, balance: Option<BalanceClient>) -> Self {
        Self { reputation, balance }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub async fn reputation(&self, address: &str) -> Enriched<ReputationReport> {
        match &self.reputation {
            Some(client) => wrap(client.lookup(address).await, "reputation", address),
            None => Enriched::Disabled,
        }
    }

    pub async fn balance(&self, address: &str) -> Enriched<NativeBalance> {
        match &self.balance {
            Some(client) => wrap(client.lookup(address).await, "balance", address),
            None => Enriched::Disabled,
        }
    }

    /// Both lookups run concurrently and independently
    pub async fn enrich(
        &self,
        contract: &str,
        deployer: &str,
    ) -> (Enriched<ReputationReport>, Enriched<NativeBalance>) {
        tokio::join!(self.reputation(contract), self.balance(deployer))
    }
}

fn wrap<T>(result: Result<T, EnrichmentError>, source: &str, address: &str) -> Enriched<T> {
    match result {
        Ok(data) => Enriched::Available { data },
        Err(e) => {
            let reason = e.to_string();
            let context = LogContext::new("enrichment", source).with_address(address);
            ErrorLogger::log_error(&ListenerError::Enrichment(e), Some(context));
            Enriched::Unavailable { reason }
        }
    }
}
