#![allow(dead_code)]

use std::sync::Arc;
use streamload::transport::FakeTransport;
use streamload::{Compression, Result, StreamLoadClient};

pub const DATABASE: &str = "demo";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn origin(host: &str) -> String {
    format!("http://{host}:8030")
}

/// A client over `hosts` (all on port 8030) sending through `fake`.
pub fn client(hosts: &[&str], fake: &Arc<FakeTransport>) -> Result<StreamLoadClient> {
    init_logging();
    hosts
        .iter()
        .fold(StreamLoadClient::builder(), |b, h| b.endpoint(*h, 8030))
        .database(DATABASE)
        .credentials("root", "secret")
        .transport(Arc::clone(fake))
        .build()
}

pub fn load_success(rows: i64) -> serde_json::Value {
    serde_json::json!({
        "TxnId": 42,
        "Label": "lbl",
        "Status": "Success",
        "Message": "OK",
        "NumberTotalRows": rows,
        "NumberLoadedRows": rows,
        "NumberFilteredRows": 0,
    })
}

/// The compressed encodings built into this test binary.
pub fn enabled_codecs() -> Vec<Compression> {
    let mut codecs = Vec::new();
    #[cfg(feature = "compression-gzip")]
    codecs.push(Compression::Gzip);
    #[cfg(feature = "compression-lz4")]
    codecs.push(Compression::Lz4Frame);
    #[cfg(feature = "compression-zstd")]
    codecs.push(Compression::Zstd);
    #[cfg(feature = "compression-bzip2")]
    codecs.push(Compression::Bzip2);
    codecs
}

pub fn txn_ok(label: &str) -> serde_json::Value {
    serde_json::json!({"TxnId": 7, "Label": label, "Status": "OK", "Message": ""})
}
