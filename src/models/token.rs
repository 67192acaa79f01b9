use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one enrichment source for a record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Enriched<T> {
    Available { data: T },
    Unavailable { reason: String },
    Disabled,
}

impl<T> Enriched<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Enriched::Available { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Enriched::Available { data } => Some(data),
            _ => None,
        }
    }
}

/// Categorized address lists returned by the reputation service
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReputationReport {
    #[serde(default)]
    pub safe: Vec<String>,
    #[serde(default)]
    pub suspicious: Vec<String>,
    #[serde(default)]
    pub new: Vec<String>,
    #[serde(default)]
    pub failed: Vec<String>,
}

impl ReputationReport {
    pub fn is_flagged(&self) -> bool {
        !self.suspicious.is_empty() || !self.failed.is_empty()
    }
}

/// Native currency balance of an address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NativeBalance {
    pub address: String,
    /// Base units, decimal string
    pub wei: String,
    /// Decimal-unit string, e.g. "1.5"
    pub formatted: String,
    pub symbol: String,
}

/// A newly created contract that answered all four token accessors
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenRecord {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// floor(raw_total_supply / 10^decimals)
    pub total_supply: String,
    pub raw_total_supply: String,
    pub deployer: String,
    pub block_number: u64,
    pub transaction_hash: String,
    pub chain: String,
    pub detected_at: DateTime<Utc>,
    pub reputation: Enriched<ReputationReport>,
    pub deployer_balance: Enriched<NativeBalance>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_enriched_serialization() {
        let available: Enriched<ReputationReport> = Enriched::Available {
            data: ReputationReport {
                safe: vec!["0xaaa".to_string()],
                ..Default::default()
            },
        };
        let value = serde_json::to_value(&available).unwrap();
        assert_eq!(value["status"], "available");
        assert_eq!(value["data"]["safe"][0], "0xaaa");

        let unavailable: Enriched<ReputationReport> = Enriched::Unavailable {
            reason: "Service returned status 500".to_string(),
        };
        let value = serde_json::to_value(&unavailable).unwrap();
        assert_eq!(value, json!({"status": "unavailable", "reason": "Service returned status 500"}));

        let disabled: Enriched<NativeBalance> = Enriched::Disabled;
        assert_eq!(serde_json::to_value(&disabled).unwrap(), json!({"status": "disabled"}));
    }

    #[test]
    fn test_enriched_accessors() {
        let available = Enriched::Available { data: 7u8 };
        assert!(available.is_available());
        assert_eq!(available.data(), Some(&7));

        let disabled: Enriched<u8> = Enriched::Disabled;
        assert!(!disabled.is_available());
        assert_eq!(disabled.data(), None);
    }

    #[test]
    fn test_reputation_report_partial_payload() {
        let report: ReputationReport = serde_json::from_value(json!({"suspicious": ["0xbad"]})).unwrap();
        assert!(report.safe.is_empty());
        assert!(report.is_flagged());
        assert!(!ReputationReport::default().is_flagged());
    }
}
