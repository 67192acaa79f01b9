use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::models::{TokenRecord, TransactionRecord};
use crate::report::RecordSink;

struct FeedState {
    transactions: VecDeque<TransactionRecord>,
    tokens: VecDeque<TokenRecord>,
}

/// Bounded in-memory history backing the display server
pub struct DisplayFeed {
    capacity: usize,
    state: Mutex<FeedState>,
}

impl DisplayFeed {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            state: Mutex::new(FeedState {
                transactions: VecDeque::with_capacity(capacity),
                tokens: VecDeque::new(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, FeedState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Most recent transaction records, newest first
    pub fn recent_transactions(&self, limit: usize) -> Vec<TransactionRecord> {
        self.lock().transactions.iter().rev().take(limit).cloned().collect()
    }

    /// Detected tokens, newest first
    pub fn tokens(&self) -> Vec<TokenRecord> {
        self.lock().tokens.iter().rev().cloned().collect()
    }

    pub fn transaction_count(&self) -> usize {
        self.lock().transactions.len()
    }

    pub fn token_count(&self) -> usize {
        self.lock().tokens.len()
    }
}

impl RecordSink for DisplayFeed {
    fn record_transaction(&self, record: &TransactionRecord) {
        let mut state = self.lock();
        if state.transactions.len() == self.capacity {
            state.transactions.pop_front();
        }
        state.transactions.push_back(record.clone());
    }

    fn record_token(&self, token: &TokenRecord) {
        let mut state = self.lock();
        if state.tokens.len() == self.capacity {
            state.tokens.pop_front();
        }
        state.tokens.push_back(token.clone());
    }
}
