pub mod feed;

pub use feed::DisplayFeed;

use crate::logging::{LogContext, MetricsLogger};
use crate::models::{TokenRecord, TransactionRecord};

/// Downstream consumer of processed blocks
pub trait RecordSink: Send + Sync {
    fn record_transaction(&self, record: &TransactionRecord);

    fn record_token(&self, token: &TokenRecord);
}

/// Writes records as structured log lines
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl RecordSink for LogSink {
    fn record_transaction(&self, record: &TransactionRecord) {
        let mut context = LogContext::new("report", "transaction")
            .with_block_number(record.block_number)
            .with_transaction_hash(&record.transaction_hash);
        if let Some(address) = record.receipt.as_ref().and_then(|r| r.created_contract()) {
            context = context.with_address(address);
        }
        context.debug(&format!("Block: {}, Tx Hash: {}", record.block_number, record.transaction_hash));
    }

    fn record_token(&self, token: &TokenRecord) {
        MetricsLogger::log_token_detected(&token.address, &token.symbol, token.block_number);

        let context = LogContext::new("report", "token")
            .with_address(&token.address)
            .with_block_number(token.block_number)
            .with_metadata("name", serde_json::json!(token.name))
            .with_metadata("decimals", serde_json::json!(token.decimals))
            .with_metadata("total_supply", serde_json::json!(token.total_supply))
            .with_metadata("deployer", serde_json::json!(token.deployer))
            .with_metadata("reputation", serde_json::json!(token.reputation))
            .with_metadata("deployer_balance", serde_json::json!(token.deployer_balance));
        context.info(&format!("Token {} ({}) deployed by {}", token.name, token.symbol, token.deployer));
    }
}
