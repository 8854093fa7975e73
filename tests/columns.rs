use rayon::prelude::*;
use serde::Serialize;
use streamload::columns::{column_list, extract, is_cached};
use streamload::{Columns, FieldTag, Tag, TagKind};

#[derive(Serialize)]
struct Order {
    #[serde(rename = "order_id")]
    id: u64,
    customer: String,
    #[serde(skip)]
    internal_note: String,
    amount: f64,
}

impl Columns for Order {
    const FIELDS: &'static [FieldTag] = &[
        FieldTag::new("id").named("order_id"),
        FieldTag::new("Customer"),
        FieldTag::new("internal_note").skip(),
        FieldTag::new("amount"),
    ];
}

fn orders() -> Vec<Order> {
    vec![
        Order { id: 1, customer: "acme".into(), internal_note: "vip".into(), amount: 9.5 },
        Order { id: 2, customer: "globex".into(), internal_note: String::new(), amount: 3.25 },
    ]
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn json_document_keys_follow_extracted_order() -> anyhow::Result<()> {
    let columns = extract::<Order>(TagKind::Json)?;
    assert_eq!(&columns[..], ["order_id", "customer", "amount"]);

    let doc = streamload::io::json::encode_json_records(&orders())?;
    let text = String::from_utf8(doc)?;
    let first = &text[..text.find('}').unwrap_or(text.len())];
    let positions: Vec<usize> = columns
        .iter()
        .map(|c| first.find(&format!("\"{c}\"")).expect("column present"))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    Ok(())
}

#[cfg(feature = "io-csv")]
#[test]
fn csv_rows_follow_extracted_order() -> anyhow::Result<()> {
    assert_eq!(column_list::<Order>(TagKind::Csv)?, "order_id,customer,amount");

    let doc = streamload::io::csv::encode_csv_records(&orders(), b',')?;
    assert_eq!(String::from_utf8(doc)?, "1,acme,9.5\n2,globex,3.25\n");
    Ok(())
}

// ============================================================================
// Cache
// ============================================================================

struct Metric;

impl Columns for Metric {
    const FIELDS: &'static [FieldTag] = &[
        FieldTag::new("Name"),
        FieldTag::new("Value").json(Tag::Name("v")),
    ];
}

#[test]
fn repeated_extraction_is_stable() -> anyhow::Result<()> {
    let first = extract::<Metric>(TagKind::Json)?;
    assert!(is_cached::<Metric>(TagKind::Json));
    let second = extract::<Metric>(TagKind::Json)?;
    assert_eq!(first, second);
    assert_eq!(&second[..], ["name", "v"]);
    Ok(())
}

#[test]
fn concurrent_extraction_agrees() -> anyhow::Result<()> {
    let results: Vec<String> = (0..64)
        .into_par_iter()
        .map(|_| column_list::<Metric>(TagKind::Csv))
        .collect::<Result<Vec<String>, _>>()?;

    assert!(results.iter().all(|r| r == "name,value"));
    assert!(is_cached::<Metric>(TagKind::Csv));
    Ok(())
}
