mod common;

use common::{DATABASE, client, origin, txn_ok};
use std::sync::Arc;
use streamload::transport::{FakeTransport, Method};
use streamload::{LoadOptions, Operation, StreamLoadError};

fn prepared(label: &str) -> serde_json::Value {
    serde_json::json!({
        "TxnId": 7,
        "Label": label,
        "Status": "OK",
        "Message": "",
        "NumberTotalRows": 3,
        "NumberLoadedRows": 3,
        "LoadBytes": 18,
    })
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn begin_load_prepare_commit() -> anyhow::Result<()> {
    let fe = origin("fe");
    let fake = Arc::new(FakeTransport::new());
    fake.respond_json(&fe, 200, &txn_ok("txn-1"));
    fake.respond_json(&fe, 200, &txn_ok("txn-1"));
    fake.respond_json(&fe, 200, &prepared("txn-1"));
    fake.respond_json(&fe, 200, &prepared("txn-1"));
    let client = client(&["fe"], &fake)?;

    let begun = client.begin_transaction("txn-1", "orders")?;
    assert_eq!(begun.txn_id, 7);
    let loaded = client.load_transaction(
        "txn-1",
        "orders",
        &b"1,10\n2,20\n3,30\n"[..],
        &LoadOptions::default().with_label("ignored"),
    )?;
    assert_eq!(loaded.status, "OK");
    let prep = client.prepare_transaction("txn-1")?;
    assert_eq!(prep.number_loaded_rows, 3);
    let commit = client.commit_transaction("txn-1")?;
    assert!(commit.is_success());

    let reqs = fake.requests();
    let calls: Vec<(Method, &str)> = reqs
        .iter()
        .map(|r| (r.method, r.url.trim_start_matches(&fe)))
        .collect();
    assert_eq!(
        calls,
        [
            (Method::Post, "/api/transaction/begin"),
            (Method::Put, "/api/transaction/load"),
            (Method::Post, "/api/transaction/prepare"),
            (Method::Post, "/api/transaction/commit"),
        ]
    );

    for req in &reqs {
        assert_eq!(req.header("label"), Some("txn-1"));
        assert_eq!(req.header("db"), Some(DATABASE));
        assert_eq!(req.header("Expect"), Some("100-continue"));
        assert!(req.header("Authorization").is_some());
    }
    assert_eq!(reqs[0].header("table"), Some("orders"));
    assert_eq!(reqs[0].header("Content-Type"), Some("application/json"));
    assert!(reqs[0].body.is_empty());
    assert_eq!(reqs[1].header("table"), Some("orders"));
    assert_eq!(reqs[1].body, b"1,10\n2,20\n3,30\n");
    assert!(reqs[2].header("table").is_none());
    assert_eq!(reqs[3].header("Content-Type"), Some("application/json"));
    Ok(())
}

#[test]
fn rollback_after_failed_load() -> anyhow::Result<()> {
    let fe = origin("fe");
    let fake = Arc::new(FakeTransport::new());
    fake.respond_json(
        &fe,
        200,
        &serde_json::json!({"Status": "Fail", "Message": "column count mismatch"}),
    );
    fake.respond_json(&fe, 200, &txn_ok("txn-2"));
    let client = client(&["fe"], &fake)?;

    let err = client
        .load_transaction("txn-2", "orders", &b"1\n"[..], &LoadOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        StreamLoadError::Status { operation: Operation::LoadTransaction, expected: "OK", .. }
    ));

    let rb = client.rollback_transaction("txn-2")?;
    assert_eq!(rb.label, "txn-2");
    let reqs = fake.requests();
    assert_eq!(reqs[1].url, format!("{fe}/api/transaction/rollback"));
    Ok(())
}

// ============================================================================
// Status checks
// ============================================================================

#[test]
fn prepare_unknown_label_surfaces_server_message() -> anyhow::Result<()> {
    let fake = Arc::new(FakeTransport::new());
    fake.respond_json(
        &origin("fe"),
        200,
        &serde_json::json!({
            "Status": "FAILED",
            "Message": "Transaction with label missing-1 not found",
        }),
    );
    let client = client(&["fe"], &fake)?;

    let err = client.prepare_transaction("missing-1").unwrap_err();

    assert_eq!(err.operation(), Some(Operation::PrepareTransaction));
    let prep = err
        .reply()
        .and_then(|r| r.as_prepare())
        .expect("prepare reply attached");
    assert!(prep.message.contains("not found"));
    assert!(!prep.is_success());
    Ok(())
}

#[test]
fn commit_accepts_non_ok_status_on_http_200() -> anyhow::Result<()> {
    let fake = Arc::new(FakeTransport::new());
    fake.respond_json(
        &origin("fe"),
        200,
        &serde_json::json!({"Status": "PUBLISH_TIMEOUT", "Message": "visible later"}),
    );
    let client = client(&["fe"], &fake)?;

    let commit = client.commit_transaction("txn-3")?;

    assert_eq!(commit.status, "PUBLISH_TIMEOUT");
    assert!(!commit.is_success());
    Ok(())
}

#[test]
fn begin_rejected_by_http_status() -> anyhow::Result<()> {
    let fake = Arc::new(FakeTransport::new());
    fake.respond_json(
        &origin("fe"),
        403,
        &serde_json::json!({"Status": "FAILED", "Message": "Access denied"}),
    );
    let client = client(&["fe"], &fake)?;

    let err = client.begin_transaction("txn-4", "orders").unwrap_err();

    match &err {
        StreamLoadError::HttpStatus { status, reply, .. } => {
            assert_eq!(*status, 403);
            assert_eq!(reply.as_begin().map(|b| b.message.as_str()), Some("Access denied"));
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}
