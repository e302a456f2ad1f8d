//! End-to-end estimation tests against local files and a mock node.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use wavelet_estimator::{
    ByteSource, CallParameter, ContractSource, EstimationError, EstimatorConfig, GasEstimator,
    VmFault,
};
use wavelet_types::Hash;

/// Checks the attached amount and echoes the first uint32 parameter.
const WALLET: &str = r#"
    (module
      (import "env" "_payload_len" (func $payload_len (result i32)))
      (import "env" "_payload" (func $payload (param i32)))
      (import "env" "_result" (func $result (param i32 i32)))
      (import "env" "_log" (func $log (param i32 i32)))
      (memory (export "memory") 1)
      (data (i32.const 4096) "received")
      (func (export "_contract_on_money_received")
        (drop (call $payload_len))
        (call $payload (i32.const 0))
        (if (i64.ne (i64.load (i32.const 104)) (i64.const 120))
          (then unreachable))
        (call $log (i32.const 4096) (i32.const 8))
        (call $result (i32.const 112) (i32.const 4)))
      (func (export "_contract_on_spin")
        (loop $l (br $l)))
      (func (export "_contract_on_checkpoint_then_spin")
        (call $log (i32.const 4096) (i32.const 8))
        (loop $l (br $l))))
"#;

fn wallet() -> Vec<u8> {
    wat::parse_str(WALLET).unwrap()
}

fn estimator_for(node_url: &str) -> GasEstimator {
    GasEstimator::new(EstimatorConfig {
        node_url: node_url.to_string(),
        ..EstimatorConfig::default()
    })
    .unwrap()
}

async fn spawn_node(contract_id: Hash, code: Vec<u8>) -> String {
    let code = Arc::new(code);
    let expected = contract_id.to_hex();

    let app = Router::new()
        .route(
            "/node",
            get(|| async { Json(json!({ "public_key": "00".repeat(32), "round": 7 })) }),
        )
        .route(
            "/accounts/:id",
            get(|Path(id): Path<String>| async move {
                Json(json!({ "public_key": id, "balance": 1000, "nonce": 3 }))
            }),
        )
        .route(
            "/contract/:id",
            get(move |Path(id): Path<String>| {
                let code = code.clone();
                let expected = expected.clone();
                async move {
                    if id == expected {
                        Ok(code.as_ref().clone())
                    } else {
                        Err(StatusCode::NOT_FOUND)
                    }
                }
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn money_received_with_default_limit() {
    let estimator = estimator_for("http://127.0.0.1:1");
    let source = ContractSource::Bytes(wallet());

    let result = estimator
        .estimate(
            &source,
            "money_received",
            120,
            &[CallParameter::Uint32(120)],
            Some(10_000_000_000),
        )
        .await
        .unwrap();

    assert!(result.gas_used > 0);
    assert!(result.gas_used < 10_000_000_000);
    assert_eq!(result.output, Some(vec![0x78, 0, 0, 0]));
    assert_eq!(result.log_lines(), vec!["received".to_string()]);
    assert_eq!(result.host_calls, 4);
}

#[tokio::test]
async fn wrong_amount_traps() {
    let estimator = estimator_for("http://127.0.0.1:1");
    let err = estimator
        .estimate(&ContractSource::Bytes(wallet()), "money_received", 5, &[], None)
        .await
        .unwrap_err();

    assert!(matches!(err, EstimationError::Vm(VmFault::Trap(_))));
    assert!(!err.is_gas_exhausted());
}

#[tokio::test]
async fn estimates_are_deterministic() {
    let estimator = estimator_for("http://127.0.0.1:1");
    let source = ContractSource::Bytes(wallet());
    let params = [
        CallParameter::Uint32(120),
        CallParameter::String("memo".into()),
        CallParameter::Bytes(ByteSource::Hex("deadbeef".into())),
    ];

    let mut runs = Vec::new();
    for _ in 0..3 {
        let result = estimator
            .estimate(&source, "money_received", 120, &params, None)
            .await
            .unwrap();
        runs.push(result);
    }

    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[1], runs[2]);

    // A fresh estimator with a cold cache agrees.
    let fresh = estimator_for("http://127.0.0.1:1")
        .estimate(&source, "money_received", 120, &params, None)
        .await
        .unwrap();
    assert_eq!(fresh.gas_used, runs[0].gas_used);
}

#[tokio::test]
async fn infinite_loop_exhausts_gas() {
    let estimator = estimator_for("http://127.0.0.1:1");
    let err = estimator
        .estimate(&ContractSource::Bytes(wallet()), "spin", 0, &[], Some(50_000))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EstimationError::Vm(VmFault::GasExhausted { limit: 50_000, .. })
    ));
    assert!(err.is_gas_exhausted());
}

#[tokio::test]
async fn exhausted_call_reports_logs_so_far() {
    let estimator = estimator_for("http://127.0.0.1:1");
    let err = estimator
        .estimate(
            &ContractSource::Bytes(wallet()),
            "checkpoint_then_spin",
            0,
            &[],
            Some(100_000),
        )
        .await
        .unwrap_err();

    assert!(err.is_gas_exhausted());
    let partial = err.partial_result().unwrap();
    assert_eq!(partial.gas_used, 100_000);
    assert_eq!(partial.log_lines(), vec!["received".to_string()]);
    assert_eq!(partial.host_calls, 1);
}

#[tokio::test]
async fn zero_limit_never_resolves_source() {
    let estimator = estimator_for("http://127.0.0.1:1");
    let source = ContractSource::File("/nonexistent/contract.wasm".into());

    let err = estimator
        .estimate(&source, "money_received", 120, &[], Some(0))
        .await
        .unwrap_err();

    assert_eq!(err, EstimationError::InvalidLimit(0));
    assert!(estimator.runtime().cache().is_empty());
}

#[tokio::test]
async fn missing_function() {
    let estimator = estimator_for("http://127.0.0.1:1");
    let err = estimator
        .estimate(&ContractSource::Bytes(wallet()), "withdraw", 0, &[], None)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EstimationError::Vm(VmFault::MissingExport("_contract_on_withdraw".into()))
    );
}

#[tokio::test]
async fn file_source() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&wallet()).unwrap();

    let estimator = estimator_for("http://127.0.0.1:1");
    let from_file = estimator
        .estimate(
            &ContractSource::File(file.path().to_path_buf()),
            "money_received",
            120,
            &[CallParameter::Uint32(1)],
            None,
        )
        .await
        .unwrap();
    let from_bytes = estimator
        .estimate_bytecode(&wallet(), "money_received", 120, &[CallParameter::Uint32(1)], None)
        .unwrap();

    assert_eq!(from_file, from_bytes);
}

#[tokio::test]
async fn missing_file_is_unavailable() {
    let estimator = estimator_for("http://127.0.0.1:1");
    let err = estimator
        .estimate(
            &ContractSource::File("/nonexistent/contract.wasm".into()),
            "money_received",
            120,
            &[],
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EstimationError::SourceUnavailable(_)));
}

#[tokio::test]
async fn node_source() {
    let contract_id = Hash::compute(b"wallet");
    let url = spawn_node(contract_id, wallet()).await;
    let estimator = estimator_for(&url);

    let source = ContractSource::parse(&contract_id.to_hex());
    assert_eq!(source, ContractSource::Node { contract_id });

    let result = estimator
        .estimate(&source, "money_received", 120, &[CallParameter::Uint32(9)], None)
        .await
        .unwrap();
    assert_eq!(result.output, Some(vec![9, 0, 0, 0]));

    let unknown = ContractSource::Node {
        contract_id: Hash::ZERO,
    };
    let err = estimator
        .estimate(&unknown, "money_received", 120, &[], None)
        .await
        .unwrap_err();
    assert!(matches!(err, EstimationError::SourceUnavailable(_)));
}

#[tokio::test]
async fn url_source() {
    let contract_id = Hash::compute(b"wallet");
    let url = spawn_node(contract_id, wallet()).await;
    let estimator = estimator_for("http://127.0.0.1:1");

    let source = ContractSource::parse(&format!("{}/contract/{}", url, contract_id));
    assert!(matches!(source, ContractSource::Url(_)));

    let result = estimator
        .estimate(&source, "money_received", 120, &[CallParameter::Uint32(3)], None)
        .await
        .unwrap();
    assert_eq!(result.output, Some(vec![3, 0, 0, 0]));
}

#[tokio::test]
async fn node_queries() {
    let url = spawn_node(Hash::ZERO, wallet()).await;
    let estimator = estimator_for(&url);

    let info = estimator.client().node_info().await.unwrap();
    assert_eq!(info["round"], 7);

    let id = Hash::from_bytes([5u8; 32]);
    let account = estimator.client().account(&id).await.unwrap();
    assert_eq!(account.public_key, id.to_hex());
    assert_eq!(account.balance, 1000);
    assert_eq!(account.nonce, 3);
}
