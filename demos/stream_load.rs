//! Load a few records into a live database.
//!
//! Configure the connection through the environment:
//!
//! ```text
//! STREAMLOAD_ENDPOINTS=fe1:8030,fe2:8030 \
//! STREAMLOAD_DATABASE=demo STREAMLOAD_USER=root STREAMLOAD_PASSWORD= \
//! RUST_LOG=streamload=debug cargo run --example stream_load
//! ```
//!
//! The target table is expected to look like
//! `CREATE TABLE users (id BIGINT, user_name VARCHAR(64), age INT)`.

use anyhow::{Context, Result};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};
use streamload::{ClientBuilder, Columns, Compression, FieldTag, LoadOptions};

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
        FieldTag::new("age"),
    ];
}

fn main() -> Result<()> {
    env_logger::init();

    let client = ClientBuilder::from_env()?
        .build()
        .context("set STREAMLOAD_ENDPOINTS, STREAMLOAD_DATABASE and STREAMLOAD_USER")?;
    let stamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

    // === Plain CSV stream load
    let csv = b"1,alice,30\n2,bob,25\n";
    let opts = LoadOptions::default()
        .with_columns("id,user_name,age")
        .with_compression(Compression::Gzip)
        .with_label(format!("demo-csv-{stamp}"));
    let resp = client.load("users", &csv[..], &opts)?;
    println!("csv: {} rows loaded in {} ms", resp.number_loaded_rows, resp.load_time_ms);

    // === JSON records, columns derived from the type
    let users = vec![
        User { id: 3, name: "carol".into(), age: 41 },
        User { id: 4, name: "dave".into(), age: 19 },
    ];
    let resp = client.load_json_records("users", &users, &LoadOptions::default())?;
    println!("json: {} rows loaded", resp.number_loaded_rows);

    // === Two loads committed together
    let label = format!("demo-txn-{stamp}");
    client.begin_transaction(&label, "users")?;
    let staged = client
        .load_transaction(&label, "users", &b"5,erin,52\n"[..], &LoadOptions::default())
        .and_then(|_| client.load_transaction(&label, "users", &b"6,frank,33\n"[..], &LoadOptions::default()))
        .and_then(|_| client.prepare_transaction(&label));
    match staged {
        Ok(prep) => {
            let commit = client.commit_transaction(&label)?;
            println!(
                "txn {}: {} rows, commit status {}",
                prep.txn_id, prep.number_loaded_rows, commit.status
            );
        }
        Err(e) => {
            eprintln!("txn {label} failed: {e}");
            client.rollback_transaction(&label)?;
        }
    }
    Ok(())
}
