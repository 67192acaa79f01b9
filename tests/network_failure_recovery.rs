use serde_json::json;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use contract_listener::blockchain::{RpcClient, TickOutcome};
use contract_listener::config::AppConfig;
use contract_listener::error::RpcError;
use contract_listener::{ChainClient, Listener};

fn block_number_response(height: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": format!("0x{:x}", height)
    }))
}

fn listener_over(endpoints: Vec<String>) -> Listener {
    let mut config = AppConfig::default();
    config.chain.endpoints = endpoints;
    config.chain.reputation_url_template = None;
    config.polling.rpc_timeout_seconds = 2;
    config.display.enabled = false;
    Listener::from_config(&config).expect("valid config")
}

/// Each transport failure mode maps onto a distinct error
#[tokio::test]
async fn test_rpc_client_with_mock_failures() {
    let mock_server = MockServer::start().await;
    let rpc_client = RpcClient::new(mock_server.uri(), 1).unwrap();

    // Server returns 500
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;
    let result = rpc_client.get_latest_block_number().await;
    assert!(matches!(result, Err(RpcError::Status { status: 500 })));

    // Server rate limits
    mock_server.reset().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;
    assert!(matches!(
        rpc_client.get_latest_block_number().await,
        Err(RpcError::RateLimit)
    ));

    // Server returns invalid JSON
    mock_server.reset().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("invalid json"))
        .mount(&mock_server)
        .await;
    assert!(matches!(
        rpc_client.get_latest_block_number().await,
        Err(RpcError::Json(_))
    ));

    // Server returns a JSON-RPC error
    mock_server.reset().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32603, "message": "Internal error"}
        })))
        .mount(&mock_server)
        .await;
    match rpc_client.get_latest_block_number().await {
        Err(RpcError::Method { code, message }) => {
            assert_eq!(code, -32603);
            assert_eq!(message, "Internal error");
        }
        other => panic!("expected method error, got {:?}", other),
    }

    // Server returns a non-string height
    mock_server.reset().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": 12
        })))
        .mount(&mock_server)
        .await;
    assert!(matches!(
        rpc_client.get_latest_block_number().await,
        Err(RpcError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(block_number_response(1).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let rpc_client = RpcClient::new(mock_server.uri(), 1).unwrap();
    let start_time = Instant::now();
    let result = rpc_client.get_latest_block_number().await;

    assert!(matches!(result, Err(RpcError::Timeout { seconds: 1 })));
    assert!(start_time.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_connection_refused_fails_quickly() {
    let rpc_client = RpcClient::new("http://127.0.0.1:9".to_string(), 2).unwrap();

    let result = timeout(Duration::from_secs(5), rpc_client.get_latest_block_number())
        .await
        .expect("refused connection should not hang");

    assert!(matches!(
        result,
        Err(RpcError::Connection(_)) | Err(RpcError::Timeout { .. }) | Err(RpcError::Http(_))
    ));
}

/// A failing first endpoint is abandoned after one tick
#[tokio::test]
async fn test_failover_to_healthy_endpoint() {
    let broken = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&broken)
        .await;

    let healthy = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("eth_blockNumber"))
        .respond_with(block_number_response(500))
        .mount(&healthy)
        .await;

    let listener = listener_over(vec![broken.uri(), healthy.uri()]);
    let poll = &listener.poll_loop;

    assert!(matches!(poll.tick().await, TickOutcome::HeightUnavailable { .. }));
    assert_eq!(listener.chain.current_endpoint(), healthy.uri());

    assert_eq!(poll.tick().await, TickOutcome::Baseline { height: 500 });
    assert_eq!(poll.tick().await, TickOutcome::NoProgress { height: 500 });

    let status = poll.status();
    assert_eq!(status.rotations, 1);
    assert_eq!(status.last_processed_block, Some(500));
}

/// With every endpoint down the cursor cycles and the loop keeps ticking
#[tokio::test]
async fn test_all_endpoints_down_cycles_back() {
    let mut servers = Vec::new();
    for _ in 0..3 {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        servers.push(server);
    }
    let endpoints: Vec<String> = servers.iter().map(|s| s.uri()).collect();

    let listener = listener_over(endpoints.clone());
    let mut visited = vec![listener.chain.current_endpoint()];
    for _ in 0..3 {
        assert!(matches!(
            listener.poll_loop.tick().await,
            TickOutcome::HeightUnavailable { .. }
        ));
        visited.push(listener.chain.current_endpoint());
    }

    assert_eq!(
        visited,
        vec![
            endpoints[0].clone(),
            endpoints[1].clone(),
            endpoints[2].clone(),
            endpoints[0].clone()
        ]
    );
    assert_eq!(listener.poll_loop.status().rotations, 3);
    assert_eq!(listener.poll_loop.last_processed(), None);
}

/// Recovery after an outage resumes from the latest height, not the missed range
#[tokio::test]
async fn test_recovery_after_outage_resumes_at_latest() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("eth_blockNumber"))
        .respond_with(block_number_response(100))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let listener = listener_over(vec![server.uri()]);
    assert_eq!(listener.poll_loop.tick().await, TickOutcome::Baseline { height: 100 });

    // Outage
    server.reset().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    for _ in 0..3 {
        assert!(matches!(
            listener.poll_loop.tick().await,
            TickOutcome::HeightUnavailable { .. }
        ));
    }

    // Back online several blocks later
    server.reset().await;
    Mock::given(method("POST"))
        .and(body_string_contains("eth_blockNumber"))
        .respond_with(block_number_response(105))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("eth_getBlockByNumber"))
        .and(body_string_contains("0x69"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {"number": "0x69", "hash": "0xb105", "timestamp": "0x1", "transactions": []}
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(
        listener.poll_loop.tick().await,
        TickOutcome::Processed { block_number: 105, tokens: 0 }
    );
    assert_eq!(listener.poll_loop.last_processed(), Some(105));
}
