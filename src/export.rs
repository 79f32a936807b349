//! JSON and CSV output for extracted records

use std::io::Write;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::config::OutputFormat;
use crate::record::ProductRecord;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Flat CSV row; the category pair is split into columns.
#[derive(Serialize)]
struct CsvRow<'a> {
    page: Option<usize>,
    name: &'a str,
    price: Decimal,
    discount_percent: Option<Decimal>,
    original_price: Option<Decimal>,
    size: Option<&'a str>,
    category_id: &'a str,
    category_ar: &'a str,
    category_en: &'a str,
}

impl<'a> From<&'a ProductRecord> for CsvRow<'a> {
    fn from(r: &'a ProductRecord) -> Self {
        Self {
            page: r.page,
            name: &r.name,
            price: r.price,
            discount_percent: r.discount_percent,
            original_price: r.original_price,
            size: r.size.as_deref(),
            category_id: &r.category.id,
            category_ar: &r.category.ar,
            category_en: &r.category.en,
        }
    }
}

pub fn write_records<W: Write>(
    records: &[ProductRecord],
    format: OutputFormat,
    writer: W,
) -> Result<(), ExportError> {
    match format {
        OutputFormat::Json => write_json(records, writer),
        OutputFormat::Csv => write_csv(records, writer),
    }
}

/// Pretty-printed JSON array.
pub fn write_json<W: Write>(records: &[ProductRecord], mut writer: W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    Ok(())
}

/// Header row plus one row per record.
pub fn write_csv<W: Write>(records: &[ProductRecord], writer: W) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    if records.is_empty() {
        // serde only emits headers alongside the first row
        csv.write_record([
            "page",
            "name",
            "price",
            "discount_percent",
            "original_price",
            "size",
            "category_id",
            "category_ar",
            "category_en",
        ])?;
    }
    for record in records {
        csv.serialize(CsvRow::from(record))?;
    }
    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::CategoryTable;
    use std::str::FromStr;

    fn record() -> ProductRecord {
        ProductRecord {
            name: "شيبسي توست".to_string(),
            price: Decimal::from_str("8.50").unwrap(),
            discount_percent: Some(Decimal::from(20)),
            original_price: Some(Decimal::from_str("10.63").unwrap()),
            size: None,
            category: CategoryTable::default().get("snacks").label(),
            page: Some(2),
        }
    }

    #[test]
    fn test_csv_has_header_and_row() {
        let mut out = Vec::new();
        write_csv(&[record()], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "page,name,price,discount_percent,original_price,size,category_id,category_ar,category_en"
        );
        assert_eq!(
            lines[1],
            "2,شيبسي توست,8.50,20,10.63,,snacks,الوجبات الخفيفة,Snacks"
        );
    }

    #[test]
    fn test_empty_csv_still_has_header() {
        let mut out = Vec::new();
        write_csv(&[], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("page,name,price"));
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_json_array() {
        let mut out = Vec::new();
        write_records(&[record()], OutputFormat::Json, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let first = &value[0];
        assert_eq!(first["name"], "شيبسي توست");
        assert_eq!(first["price"], "8.50");
        assert_eq!(first["original_price"], "10.63");
        assert_eq!(first["category"]["en"], "Snacks");
        assert!(first.get("size").is_none());
    }
}
