use std::collections::BTreeMap;

use chrono::NaiveDate;
use contracts::imports::RowErrorDetail;

use super::columns::ResolvedColumns;
use super::import_config::{FieldKind, ImportSpec};
use super::normalize;
use super::parser::CellValue;

/// Sentinel the source systems emit for "unknown"; never stored verbatim.
const UNKNOWN_SENTINEL: &str = "-";

/// One row after normalization and validation, ready for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    pub record_key: String,
    pub record_date: Option<NaiveDate>,
    pub amount: f64,
    pub quantity: i64,
    pub account: String,
    pub status: String,
    /// Every normalized field, keyed by canonical name.
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl CanonicalRecord {
    pub fn fields_json(&self) -> String {
        serde_json::to_string(&self.fields).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Validate one row independently of its siblings. `row_number` is the
/// position as the operator sees it in the spreadsheet, header row counted.
pub fn validate_row(
    spec: &ImportSpec,
    resolved: &ResolvedColumns,
    row: &[CellValue],
    row_number: usize,
) -> Result<CanonicalRecord, Vec<RowErrorDetail>> {
    let mut errors = Vec::new();
    let mut fields: BTreeMap<String, serde_json::Value> = BTreeMap::new();
    let mut record_key = String::new();

    let empty = CellValue::Empty;

    for field in spec.fields {
        let cell = resolved
            .index_of(field.name)
            .and_then(|i| row.get(i))
            .unwrap_or(&empty);

        match field.kind {
            FieldKind::Key => {
                let value = cell.as_text();
                if value.is_empty() {
                    errors.push(RowErrorDetail {
                        row: row_number,
                        field: field.name.to_string(),
                        value: String::new(),
                        message: format!("{} is required and must not be blank", field.name),
                    });
                } else {
                    fields.insert(field.name.to_string(), value.clone().into());
                    record_key = value;
                }
            }
            FieldKind::Date => match normalize::normalize_date(cell, spec.date_patterns) {
                Some(date) => {
                    fields.insert(
                        field.name.to_string(),
                        date.format("%Y-%m-%d").to_string().into(),
                    );
                }
                None if field.required => {
                    errors.push(RowErrorDetail {
                        row: row_number,
                        field: field.name.to_string(),
                        value: cell.as_text(),
                        message: format!(
                            "{} must be a date in one of {}",
                            field.name,
                            spec.date_patterns.join(", ")
                        ),
                    });
                }
                None => {}
            },
            FieldKind::Amount => {
                if cell.is_empty() && field.required {
                    errors.push(RowErrorDetail {
                        row: row_number,
                        field: field.name.to_string(),
                        value: String::new(),
                        message: format!("{} is required", field.name),
                    });
                } else {
                    let amount = normalize::normalize_amount(cell);
                    fields.insert(field.name.to_string(), amount.into());
                }
            }
            FieldKind::Integer => {
                if cell.is_empty() && field.required {
                    errors.push(RowErrorDetail {
                        row: row_number,
                        field: field.name.to_string(),
                        value: String::new(),
                        message: format!("{} is required", field.name),
                    });
                } else {
                    let n = normalize::normalize_integer(cell);
                    fields.insert(field.name.to_string(), n.into());
                }
            }
            FieldKind::Text => {
                let trimmed = cell.as_text();
                let value = if trimmed.is_empty() || trimmed == UNKNOWN_SENTINEL {
                    field.default_label.unwrap_or("").to_string()
                } else {
                    trimmed
                };
                if value.is_empty() && field.required {
                    errors.push(RowErrorDetail {
                        row: row_number,
                        field: field.name.to_string(),
                        value: cell.as_text(),
                        message: format!("{} is required and must not be blank", field.name),
                    });
                } else if !value.is_empty() {
                    fields.insert(field.name.to_string(), value.into());
                }
            }
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let date_of = |name: Option<&str>| -> Option<NaiveDate> {
        name.and_then(|n| fields.get(n))
            .and_then(|v| v.as_str())
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    };
    let text_of = |name: Option<&str>| -> String {
        name.and_then(|n| fields.get(n))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    };

    Ok(CanonicalRecord {
        record_key,
        record_date: date_of(spec.date_field),
        amount: spec
            .amount_field
            .and_then(|n| fields.get(n))
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0),
        quantity: spec
            .quantity_field
            .and_then(|n| fields.get(n))
            .and_then(|v| v.as_i64())
            .unwrap_or(0),
        account: text_of(spec.account_field),
        status: text_of(spec.status_field),
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::u601_bulk_import::columns::resolve;
    use crate::usecases::u601_bulk_import::import_config::spec_for;
    use contracts::imports::ImportType;

    fn sales_columns() -> (&'static ImportSpec, ResolvedColumns) {
        let spec = spec_for(ImportType::Sales);
        let headers: Vec<String> = [
            "Order ID",
            "Order Date",
            "Product Name",
            "Quantity",
            "Total Amount",
            "Customer Name",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let resolved = resolve(spec, &headers).unwrap();
        (spec, resolved)
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn valid_sales_row_becomes_canonical_record() {
        let (spec, cols) = sales_columns();
        let row = vec![
            text("INV-001"),
            text("05/03/21"),
            text("Batik Dress"),
            text("2"),
            text("1,250,000"),
            text("Siti"),
        ];
        let record = validate_row(spec, &cols, &row, 2).unwrap();
        assert_eq!(record.record_key, "INV-001");
        assert_eq!(
            record.record_date,
            NaiveDate::from_ymd_opt(2021, 3, 5)
        );
        assert_eq!(record.amount, 1_250_000.0);
        assert_eq!(record.quantity, 2);
        assert_eq!(record.account, "Siti");
        assert_eq!(record.fields["product_name"], "Batik Dress");
    }

    #[test]
    fn blank_key_is_a_row_error() {
        let (spec, cols) = sales_columns();
        let row = vec![
            CellValue::Empty,
            text("05/03/2021"),
            text("Dress"),
            text("1"),
            text("100"),
            text("Siti"),
        ];
        let errors = validate_row(spec, &cols, &row, 3).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 3);
        assert_eq!(errors[0].field, "order_id");
    }

    #[test]
    fn unparseable_mandatory_date_names_expected_formats() {
        let (spec, cols) = sales_columns();
        let row = vec![
            text("INV-002"),
            text("sometime soon"),
            text("Dress"),
            text("1"),
            text("100"),
            text("Siti"),
        ];
        let errors = validate_row(spec, &cols, &row, 2).unwrap_err();
        assert_eq!(errors[0].field, "order_date");
        assert!(errors[0].message.contains("%d/%m/%y"));
        assert_eq!(errors[0].value, "sometime soon");
    }

    #[test]
    fn sentinel_dash_becomes_default_label() {
        let (spec, cols) = sales_columns();
        let row = vec![
            text("INV-003"),
            text("05/03/2021"),
            text("-"),
            text("1"),
            text("100"),
            CellValue::Empty,
        ];
        let record = validate_row(spec, &cols, &row, 2).unwrap();
        assert_eq!(record.fields["product_name"], "Unknown");
        assert_eq!(record.account, "Unknown");
    }

    #[test]
    fn blank_optional_amount_defaults_to_zero() {
        let (spec, cols) = sales_columns();
        let row = vec![
            text("INV-004"),
            text("05/03/2021"),
            text("Dress"),
            CellValue::Empty,
            CellValue::Empty,
            text("Siti"),
        ];
        let record = validate_row(spec, &cols, &row, 2).unwrap();
        assert_eq!(record.amount, 0.0);
        assert_eq!(record.quantity, 0);
    }

    #[test]
    fn mandatory_integer_blank_is_an_error() {
        let spec = spec_for(ImportType::Stock);
        let headers: Vec<String> = ["SKU", "Quantity"].iter().map(|s| s.to_string()).collect();
        let cols = resolve(spec, &headers).unwrap();
        let row = vec![text("SKU-1"), CellValue::Empty];
        let errors = validate_row(spec, &cols, &row, 2).unwrap_err();
        assert_eq!(errors[0].field, "quantity");
    }

    #[test]
    fn multiple_failures_are_all_reported() {
        let (spec, cols) = sales_columns();
        let row = vec![
            CellValue::Empty,
            text("garbage"),
            text("Dress"),
            text("1"),
            text("100"),
            text("Siti"),
        ];
        let errors = validate_row(spec, &cols, &row, 5).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"order_id"));
        assert!(fields.contains(&"order_date"));
    }
}
