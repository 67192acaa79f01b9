use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use crate::blockchain::{ChainClient, ContractClassifier};
use crate::error::{ClassificationMismatch, RpcError};
use crate::logging::{LogContext, MetricsLogger};
use crate::models::{Receipt, TokenRecord, TransactionRecord};
use crate::report::RecordSink;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),
    #[error("Block {0} not available from endpoint")]
    BlockUnavailable(u64),
}

/// Summary of one processed block
#[derive(Debug, Clone)]
pub struct BlockOutcome {
    pub block_number: u64,
    pub transaction_count: usize,
    pub creation_count: usize,
    pub tokens: Vec<TokenRecord>,
}

/// Fetches one block, its creation receipts, and classifies new contracts
pub struct BlockProcessor {
    chain: Arc<dyn ChainClient>,
    classifier: ContractClassifier,
    sinks: Vec<Arc<dyn RecordSink>>,
}

impl BlockProcessor {
    pub fn new(chain: Arc<dyn ChainClient>, classifier: ContractClassifier, sinks: Vec<Arc<dyn RecordSink>>) -> Self {
        Self {
            chain,
            classifier,
            sinks,
        }
    }

    /// Process a block: emit one record per transaction in node order and
    /// one token record per created contract that passes classification
    pub async fn process_block(&self, block_number: u64) -> Result<BlockOutcome, ProcessError> {
        let started = Instant::now();

        let block = self
            .chain
            .get_block_with_transactions(block_number)
            .await?
            .ok_or(ProcessError::BlockUnavailable(block_number))?;

        let creation_hashes: Vec<String> = block
            .transactions
            .iter()
            .filter(|tx| tx.is_contract_creation())
            .map(|tx| tx.hash.clone())
            .collect();

        let receipts = match self.chain.get_transaction_receipts(&creation_hashes).await {
            Ok(receipts) => receipts,
            Err(e) => {
                // The block is claimed already; show what we have before giving up on it
                for tx in &block.transactions {
                    self.emit_transaction(TransactionRecord {
                        block_number,
                        transaction_hash: tx.hash.clone(),
                        receipt: None,
                    });
                }
                return Err(ProcessError::Rpc(e));
            }
        };

        let mut by_hash: HashMap<String, Receipt> = creation_hashes
            .into_iter()
            .zip(receipts)
            .filter_map(|(hash, receipt)| receipt.map(|r| (hash, r)))
            .collect();

        let mut created = Vec::new();
        for tx in &block.transactions {
            let receipt = by_hash.remove(&tx.hash);
            if let Some(r) = receipt.as_ref().filter(|r| r.created_contract().is_some()) {
                created.push(r.clone());
            }
            self.emit_transaction(TransactionRecord {
                block_number,
                transaction_hash: tx.hash.clone(),
                receipt,
            });
        }

        let results = join_all(
            created
                .iter()
                .map(|receipt| self.classifier.classify(receipt, block_number)),
        )
        .await;

        let mut tokens = Vec::new();
        for (receipt, result) in created.iter().zip(results) {
            match result {
                Ok(token) => {
                    for sink in &self.sinks {
                        sink.record_token(&token);
                    }
                    tokens.push(token);
                }
                Err(mismatch) => trace_mismatch(receipt, &mismatch),
            }
        }

        MetricsLogger::log_block_processed(
            block_number,
            block.transactions.len(),
            created.len(),
            tokens.len(),
            started.elapsed().as_millis() as u64,
        );

        Ok(BlockOutcome {
            block_number,
            transaction_count: block.transactions.len(),
            creation_count: created.len(),
            tokens,
        })
    }

    fn emit_transaction(&self, record: TransactionRecord) {
        for sink in &self.sinks {
            sink.record_transaction(&record);
        }
    }
}

fn trace_mismatch(receipt: &Receipt, mismatch: &ClassificationMismatch) {
    let context = LogContext::new("classifier", "classify")
        .with_transaction_hash(&receipt.transaction_hash)
        .with_address(receipt.created_contract().unwrap_or_default());
    context.debug(&format!("Contract is not a token: {}", mismatch));
}
