use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::address::is_null_address;
use crate::models::units::parse_hex_u64;

/// Block as returned by `eth_getBlockByNumber` with full transaction objects
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub number: String,
    pub hash: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Block height decoded from the hex quantity
    pub fn height(&self) -> Option<u64> {
        parse_hex_u64(&self.number).ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub hash: String,
    pub from: String,
    /// Absent for contract creation
    #[serde(default)]
    pub to: Option<String>,
    #[serde(rename = "blockNumber", default)]
    pub block_number: Option<String>,
}

impl Transaction {
    pub fn is_contract_creation(&self) -> bool {
        is_null_address(self.to.as_deref())
    }
}

/// Transaction receipt; unknown node fields are kept for display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Receipt {
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
    #[serde(rename = "contractAddress", default)]
    pub contract_address: Option<String>,
    pub from: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Receipt {
    /// Address of the contract this receipt created, if any
    pub fn created_contract(&self) -> Option<&str> {
        self.contract_address
            .as_deref()
            .filter(|addr| !is_null_address(Some(addr)))
    }

    /// Pre-Byzantium receipts carry no status; treat them as successful
    pub fn succeeded(&self) -> bool {
        match self.status.as_deref() {
            Some(status) => parse_hex_u64(status).map(|s| s == 1).unwrap_or(false),
            None => true,
        }
    }
}

/// One line of the display feed: every transaction of a processed block,
/// with the receipt attached for contract creations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRecord {
    pub block_number: u64,
    pub transaction_hash: String,
    pub receipt: Option<Receipt>,
}
