use std::fmt::Write;

use crate::blockchain::PollStatus;
use crate::models::{Enriched, TokenRecord, TransactionRecord};

/// Escape text for HTML element content and attribute values
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Server-rendered listener page
pub fn render_index(
    chain_name: &str,
    status: &PollStatus,
    records: &[TransactionRecord],
    tokens: &[TokenRecord],
) -> String {
    let title = format!("{} Block Listener", capitalize(chain_name));
    let mut html = String::new();

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n",
        title = escape_html(&title)
    );

    let latest = match status.last_processed_block {
        Some(block) => format!("Latest Block: {}", block),
        None => "Waiting for new blocks...".to_string(),
    };
    let _ = write!(
        html,
        "<div id=\"block-container\"><p>{}</p><p>Endpoint: {}</p></div>\n",
        escape_html(&latest),
        escape_html(&status.current_endpoint)
    );

    let (state, action) = if status.enabled { ("on", "Stop") } else { ("off", "Start") };
    let _ = write!(
        html,
        "<div id=\"listener-control\">\n<form method=\"post\" action=\"/listener/toggle\">\n\
         <label>Listener: {}</label> <button type=\"submit\">{}</button>\n</form>\n</div>\n",
        state, action
    );

    html.push_str("<div id=\"tokens-container\">\n<h2>Detected Tokens</h2>\n<ul id=\"tokens-list\">\n");
    for token in tokens {
        let _ = write!(
            html,
            "<li>{} ({}) at {}, supply {}, decimals {}, deployer {}{}</li>\n",
            escape_html(&token.name),
            escape_html(&token.symbol),
            escape_html(&token.address),
            escape_html(&token.total_supply),
            token.decimals,
            escape_html(&token.deployer),
            reputation_note(token)
        );
    }
    html.push_str("</ul>\n</div>\n");

    html.push_str("<div id=\"transactions-container\">\n<h2>Transactions</h2>\n<ul id=\"transactions-list\">\n");
    for record in records {
        let _ = write!(
            html,
            "<li>Block: {}, Tx Hash: {}",
            record.block_number,
            escape_html(&record.transaction_hash)
        );
        if let Some(receipt) = record.receipt.as_ref().filter(|r| r.created_contract().is_some()) {
            let pretty = serde_json::to_string_pretty(receipt).unwrap_or_default();
            let _ = write!(html, "<pre>{}</pre>", escape_html(&pretty));
        }
        html.push_str("</li>\n");
    }
    html.push_str("</ul>\n</div>\n</body>\n</html>\n");

    html
}

fn reputation_note(token: &TokenRecord) -> String {
    match &token.reputation {
        Enriched::Available { data } if data.is_flagged() => " [flagged]".to_string(),
        Enriched::Available { .. } => " [reputation ok]".to_string(),
        Enriched::Unavailable { .. } => " [reputation unavailable]".to_string(),
        Enriched::Disabled => String::new(),
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Receipt;
    use serde_json::Map;

    fn status(enabled: bool, last: Option<u64>) -> PollStatus {
        PollStatus {
            enabled,
            processing: false,
            last_processed_block: last,
            ticks: 0,
            blocks_processed: 0,
            blocks_skipped: 0,
            rotations: 0,
            tokens_detected: 0,
            current_endpoint: "https://mainnet.base.org".to_string(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"x\" & 'y'</b>"), "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;");
    }

    #[test]
    fn test_render_waiting_page() {
        let html = render_index("base", &status(true, None), &[], &[]);
        assert!(html.contains("<title>Base Block Listener</title>"));
        assert!(html.contains("Waiting for new blocks..."));
        assert!(html.contains("Listener: on"));
    }

    #[test]
    fn test_render_records_with_creation_receipt() {
        let creation = TransactionRecord {
            block_number: 101,
            transaction_hash: "0xcreate".to_string(),
            receipt: Some(Receipt {
                transaction_hash: "0xcreate".to_string(),
                contract_address: Some("0x5fbdb2315678afecb367f032d93f642f64180aa3".to_string()),
                from: "0xdeployer".to_string(),
                status: Some("0x1".to_string()),
                extra: Map::new(),
            }),
        };
        let transfer = TransactionRecord {
            block_number: 101,
            transaction_hash: "0xtransfer".to_string(),
            receipt: None,
        };

        let html = render_index("base", &status(false, Some(101)), &[creation, transfer], &[]);
        assert!(html.contains("Latest Block: 101"));
        assert!(html.contains("<li>Block: 101, Tx Hash: 0xcreate<pre>"));
        assert!(html.contains("&quot;contractAddress&quot;"));
        assert!(html.contains("<li>Block: 101, Tx Hash: 0xtransfer</li>"));
        assert!(html.contains("Listener: off"));
    }

    #[test]
    fn test_token_names_are_escaped() {
        let token = TokenRecord {
            address: "0xtoken".to_string(),
            name: "<script>alert(1)</script>".to_string(),
            symbol: "XSS".to_string(),
            decimals: 18,
            total_supply: "1000".to_string(),
            raw_total_supply: "1000000000000000000000".to_string(),
            deployer: "0xdeployer".to_string(),
            block_number: 5,
            transaction_hash: "0xtx".to_string(),
            chain: "base".to_string(),
            detected_at: chrono::Utc::now(),
            reputation: Enriched::Disabled,
            deployer_balance: Enriched::Disabled,
        };

        let html = render_index("base", &status(true, Some(5)), &[], &[token]);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
