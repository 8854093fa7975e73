mod common;

use common::{DATABASE, client, enabled_codecs, load_success, origin};
use rayon::prelude::*;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use streamload::io::compression::decompress;
use streamload::transport::{FakeTransport, Method};
use streamload::{
    Columns, DataFormat, FieldTag, LoadOptions, Operation, StreamLoadClient,
    StreamLoadError, Tag,
};

// ============================================================================
// Request shape
// ============================================================================

#[test]
fn stream_load_request_shape() -> anyhow::Result<()> {
    let fake = Arc::new(FakeTransport::new());
    fake.respond_json(&origin("fe"), 200, &load_success(2));
    let client = client(&["fe"], &fake)?;

    let opts = LoadOptions::default()
        .with_format(DataFormat::Csv)
        .with_columns("id,name")
        .with_column_separator("|")
        .with_row_delimiter("\\x02")
        .with_where("id > 0")
        .with_max_filter_ratio(0.2)
        .with_timeout(Duration::from_millis(90_500))
        .with_strict_mode(true)
        .with_partitions(["p1", "p2"])
        .with_temporary_partitions(["tp1", "tp2"])
        .with_timezone("Asia/Shanghai")
        .with_log_rejected_record_num(-1)
        .with_load_mem_limit(1 << 30);
    client.load("users", &b"1|a\n2|b\n"[..], &opts)?;

    let reqs = fake.requests();
    let req = &reqs[0];
    assert_eq!(req.method, Method::Put);
    assert_eq!(req.url, format!("http://fe:8030/api/{DATABASE}/users/_stream_load"));
    assert_eq!(req.body, b"1|a\n2|b\n");
    // "root:secret"
    assert_eq!(req.header("Authorization"), Some("Basic cm9vdDpzZWNyZXQ="));
    assert_eq!(req.header("Expect"), Some("100-continue"));
    assert_eq!(req.header("format"), Some("csv"));
    assert_eq!(req.header("columns"), Some("id,name"));
    assert_eq!(req.header("column_separator"), Some("|"));
    assert_eq!(req.header("row_delimiter"), Some("\\x02"));
    assert_eq!(req.header("where"), Some("id > 0"));
    assert_eq!(req.header("max_filter_ratio"), Some("0.2"));
    assert_eq!(req.header("timeout"), Some("91"));
    assert_eq!(req.header("strict_mode"), Some("true"));
    assert_eq!(req.header("strip_outer_array"), Some("false"));
    assert_eq!(req.header("partitions"), Some("p1,p2"));
    assert_eq!(req.header("temporary_partitions"), Some("tp1,tp2"));
    assert_eq!(req.header("timezone"), Some("Asia/Shanghai"));
    assert_eq!(req.header("log_rejected_record_num"), Some("-1"));
    assert_eq!(req.header("load_mem_limit"), Some("1073741824"));
    Ok(())
}

#[test]
fn unset_options_send_no_header() -> anyhow::Result<()> {
    let fake = Arc::new(FakeTransport::new());
    fake.respond_json(&origin("fe"), 200, &load_success(1));
    let client = client(&["fe"], &fake)?;

    client.load("t", &b"x"[..], &LoadOptions::default().with_columns(""))?;

    let reqs = fake.requests();
    let req = &reqs[0];
    for name in [
        "format",
        "compression",
        "columns",
        "column_separator",
        "row_delimiter",
        "where",
        "max_filter_ratio",
        "timeout",
        "strict_mode",
        "label",
        "partitions",
        "temporary_partitions",
        "log_rejected_record_num",
        "timezone",
        "load_mem_limit",
    ] {
        assert!(req.header(name).is_none(), "unexpected header {name}");
    }
    assert_eq!(req.header("strip_outer_array"), Some("false"));
    Ok(())
}

#[test]
fn timeout_rounds_up_to_whole_seconds() {
    for (timeout, expected) in [
        (Duration::from_millis(500), "1"),
        (Duration::from_millis(1), "1"),
        (Duration::from_secs(600), "600"),
        (Duration::from_millis(600_001), "601"),
    ] {
        let headers = LoadOptions::default().with_timeout(timeout).headers();
        assert_eq!(headers.get("timeout"), Some(expected), "{timeout:?}");
    }
}

#[test]
fn compressed_body_and_header() -> anyhow::Result<()> {
    let raw = b"1,alice,30\n2,bob,25\n".repeat(50);
    for compression in enabled_codecs() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond_json(&origin("fe"), 200, &load_success(100));
        let client = client(&["fe"], &fake)?;

        let opts = LoadOptions::default().with_compression(compression);
        client.load("t", &raw[..], &opts)?;

        let reqs = fake.requests();
        let req = &reqs[0];
        assert_eq!(req.header("compression"), compression.header_value());
        assert_ne!(req.body, raw);
        assert_eq!(decompress(&req.body, compression)?, raw);
    }
    Ok(())
}

#[test]
fn default_headers_are_sent_and_overridden() -> anyhow::Result<()> {
    let fake = Arc::new(FakeTransport::new());
    fake.respond_json(&origin("fe"), 200, &load_success(1));
    let client = StreamLoadClient::builder()
        .endpoint("fe", 8030)
        .database(DATABASE)
        .credentials("root", "")
        .default_header("timezone", "UTC")
        .default_header("columns", "a,b")
        .default_header("Authorization", "Bearer nope")
        .transport(Arc::clone(&fake))
        .build()?;

    client.load("t", &b"x"[..], &LoadOptions::default().with_columns("id"))?;

    let reqs = fake.requests();
    let req = &reqs[0];
    assert_eq!(req.header("timezone"), Some("UTC"));
    assert_eq!(req.header("columns"), Some("id"));
    assert_eq!(req.header("Authorization"), Some("Basic cm9vdDo="));
    Ok(())
}

// ============================================================================
// Reply classification
// ============================================================================

#[test]
fn fail_status_on_http_200_carries_reply() -> anyhow::Result<()> {
    let fake = Arc::new(FakeTransport::new());
    fake.respond_json(
        &origin("fe"),
        200,
        &serde_json::json!({
            "Status": "Fail",
            "Message": "too many filtered rows",
            "NumberFilteredRows": 3,
            "ErrorURL": "http://be1:8040/api/_load_error_log?file=x",
        }),
    );
    let client = client(&["fe"], &fake)?;

    let err = client
        .load("t", &b"x"[..], &LoadOptions::default())
        .unwrap_err();

    assert_eq!(err.operation(), Some(Operation::StreamLoad));
    assert!(err.to_string().contains("too many filtered rows"));
    assert!(matches!(err, StreamLoadError::Status { expected: "Success", .. }));
    let reply = err.into_reply().expect("reply attached");
    let load = reply.as_load().expect("load reply");
    assert_eq!(load.status, "Fail");
    assert_eq!(load.number_filtered_rows, 3);
    assert_eq!(load.error_url, "http://be1:8040/api/_load_error_log?file=x");
    Ok(())
}

#[test]
fn unknown_and_missing_fields_decode() -> anyhow::Result<()> {
    let fake = Arc::new(FakeTransport::new());
    fake.respond_json(
        &origin("fe"),
        200,
        &serde_json::json!({"Status": "Success", "SomethingNew": [1, 2]}),
    );
    let client = client(&["fe"], &fake)?;

    let resp = client.load("t", &b"x"[..], &LoadOptions::default())?;
    assert!(resp.is_success());
    assert_eq!(resp.number_loaded_rows, 0);
    assert!(resp.label.is_empty());
    Ok(())
}

// ============================================================================
// Payload sources
// ============================================================================

#[test]
fn load_from_file() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    for i in 0..1000 {
        writeln!(file, "{i},user{i}")?;
    }
    file.flush()?;

    let fake = Arc::new(FakeTransport::new());
    fake.respond_json(&origin("fe"), 200, &load_success(1000));
    let client = client(&["fe"], &fake)?;

    let resp = client.load("t", std::fs::File::open(file.path())?, &LoadOptions::default())?;
    assert_eq!(resp.number_loaded_rows, 1000);
    assert_eq!(fake.requests()[0].body, std::fs::read(file.path())?);
    Ok(())
}

#[derive(Serialize)]
struct User {
    id: u64,
    #[serde(rename = "user_name")]
    name: String,
    age: u8,
}

impl Columns for User {
    const FIELDS: &'static [FieldTag] = &[
        FieldTag::new("id"),
        FieldTag::new("name").named("user_name"),
        FieldTag::new("age").csv(Tag::Skip),
    ];
}

fn users() -> Vec<User> {
    vec![
        User { id: 1, name: "alice".into(), age: 30 },
        User { id: 2, name: "bob".into(), age: 25 },
    ]
}

#[cfg(feature = "compression-zstd")]
#[test]
fn json_records_load() -> anyhow::Result<()> {
    let fake = Arc::new(FakeTransport::new());
    fake.respond_json(&origin("fe"), 200, &load_success(2));
    let client = client(&["fe"], &fake)?;

    let opts = LoadOptions::default().with_label("json-1");
    client.load_json_records("users", &users(), &opts)?;

    let reqs = fake.requests();
    let req = &reqs[0];
    assert_eq!(req.header("format"), Some("json"));
    assert_eq!(req.header("columns"), Some("id,user_name,age"));
    assert_eq!(req.header("compression"), Some("ZSTD"));
    assert_eq!(req.header("strip_outer_array"), Some("true"));
    assert_eq!(req.header("label"), Some("json-1"));
    let doc: serde_json::Value = serde_json::from_slice(&decompress(&req.body, streamload::Compression::Zstd)?)?;
    assert_eq!(doc[1]["user_name"], "bob");
    // caller's options untouched
    assert_eq!(opts.format, None);
    Ok(())
}

#[cfg(feature = "io-csv")]
#[derive(Serialize)]
struct Pair {
    id: u64,
    name: String,
}

#[cfg(feature = "io-csv")]
impl Columns for Pair {
    const FIELDS: &'static [FieldTag] = &[FieldTag::new("ID"), FieldTag::new("Name")];
}

#[cfg(not(feature = "compression-zstd"))]
#[test]
fn json_records_load_uncompressed_without_zstd() -> anyhow::Result<()> {
    let fake = Arc::new(FakeTransport::new());
    fake.respond_json(&origin("fe"), 200, &load_success(2));
    let client = client(&["fe"], &fake)?;

    client.load_json_records("users", &users(), &LoadOptions::default())?;

    let reqs = fake.requests();
    let req = &reqs[0];
    assert!(req.header("compression").is_none());
    assert_eq!(req.header("strip_outer_array"), Some("true"));
    let doc: serde_json::Value = serde_json::from_slice(&req.body)?;
    assert_eq!(doc[0]["user_name"], "alice");
    Ok(())
}

#[cfg(feature = "io-csv")]
#[test]
fn csv_records_load() -> anyhow::Result<()> {
    let fake = Arc::new(FakeTransport::new());
    fake.respond_json(&origin("fe"), 200, &load_success(2));
    let client = client(&["fe"], &fake)?;

    let rows = vec![
        Pair { id: 1, name: "alice".into() },
        Pair { id: 2, name: "bob".into() },
    ];
    client.load_csv_records("pairs", &rows, &LoadOptions::default().with_column_separator("\t"))?;

    let reqs = fake.requests();
    let req = &reqs[0];
    assert_eq!(req.header("format"), Some("csv"));
    assert_eq!(req.header("columns"), Some("id,name"));
    assert_eq!(req.header("column_separator"), Some("\t"));
    assert_eq!(req.body, b"1\talice\n2\tbob\n");
    Ok(())
}

#[test]
fn empty_records_fail_before_sending() -> anyhow::Result<()> {
    let fake = Arc::new(FakeTransport::new());
    let client = client(&["fe"], &fake)?;

    let err = client
        .load_json_records::<User>("users", &[], &LoadOptions::default())
        .unwrap_err();

    assert!(matches!(err, StreamLoadError::Payload { .. }));
    assert_eq!(fake.request_count(), 0);
    Ok(())
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn concurrent_loads_share_one_client() -> anyhow::Result<()> {
    let fake = Arc::new(FakeTransport::new());
    for _ in 0..32 {
        fake.respond_json(&origin("fe"), 200, &load_success(1));
    }
    let client = client(&["fe"], &fake)?;

    let loaded: i64 = (0..32)
        .into_par_iter()
        .map(|i| {
            let opts = LoadOptions::default().with_label(format!("par-{i}"));
            client
                .load("t", format!("{i}\n").as_bytes(), &opts)
                .map(|r| r.number_loaded_rows)
        })
        .collect::<streamload::Result<Vec<_>>>()?
        .into_iter()
        .sum();

    assert_eq!(loaded, 32);
    assert_eq!(fake.request_count(), 32);
    Ok(())
}
