use serde::{Deserialize, Serialize};

/// Import type tag. One per business-record family that can be uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportType {
    Sales,
    Products,
    Stock,
    Advertising,
    AdvertisingSettlement,
    ReturnsAndCancellations,
    MarketplaceReimbursements,
    CommissionAdjustments,
    AffiliateSamples,
}

impl ImportType {
    pub const ALL: [ImportType; 9] = [
        ImportType::Sales,
        ImportType::Products,
        ImportType::Stock,
        ImportType::Advertising,
        ImportType::AdvertisingSettlement,
        ImportType::ReturnsAndCancellations,
        ImportType::MarketplaceReimbursements,
        ImportType::CommissionAdjustments,
        ImportType::AffiliateSamples,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportType::Sales => "sales",
            ImportType::Products => "products",
            ImportType::Stock => "stock",
            ImportType::Advertising => "advertising",
            ImportType::AdvertisingSettlement => "advertising-settlement",
            ImportType::ReturnsAndCancellations => "returns-and-cancellations",
            ImportType::MarketplaceReimbursements => "marketplace-reimbursements",
            ImportType::CommissionAdjustments => "commission-adjustments",
            ImportType::AffiliateSamples => "affiliate-samples",
        }
    }

    pub fn parse(s: &str) -> Option<ImportType> {
        ImportType::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    /// Date-range overlap between uploads is only a meaningful duplicate
    /// signal for record families keyed to a transaction date.
    pub fn is_sales_like(&self) -> bool {
        matches!(
            self,
            ImportType::Sales
                | ImportType::AdvertisingSettlement
                | ImportType::ReturnsAndCancellations
                | ImportType::MarketplaceReimbursements
        )
    }
}

impl std::fmt::Display for ImportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source file kind, selected by extension sniffing on upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Spreadsheet,
    Csv,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Spreadsheet => "spreadsheet",
            FileKind::Csv => "csv",
        }
    }
}

/// Lifecycle of one upload-and-process run.
///
/// A batch that stays `processing` after its request has ended means the run
/// crashed mid-way and the file should be re-uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Processing,
    Completed,
    Partial,
    Failed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Processing => "processing",
            BatchStatus::Completed => "completed",
            BatchStatus::Partial => "partial",
            BatchStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<BatchStatus> {
        match s {
            "processing" => Some(BatchStatus::Processing),
            "completed" => Some(BatchStatus::Completed),
            "partial" => Some(BatchStatus::Partial),
            "failed" => Some(BatchStatus::Failed),
            _ => None,
        }
    }
}

/// One recorded row-level failure. Enough detail to fix the source file:
/// row number as seen in the spreadsheet (header = row 1), canonical field
/// name, the offending value and an operator-readable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowErrorDetail {
    pub row: usize,
    pub field: String,
    pub value: String,
    pub message: String,
}

/// Result of one finished import run, returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    /// Records inserted for the first time.
    pub imported: i32,
    /// Records whose natural key already existed and were updated in place.
    pub updated: i32,
    /// Rows rejected by validation or persistence.
    pub errors: i32,
    pub batch_id: String,
    pub valid_rows: i32,
    pub total_rows: i32,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub error_details: Vec<RowErrorDetail>,
    pub file_name: String,
    pub file_type: FileKind,
}

/// API projection of one import_batch row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBatchInfo {
    pub id: String,
    pub label: String,
    pub import_type: String,
    pub file_name: String,
    pub file_type: String,
    pub total_rows: i32,
    pub valid_rows: i32,
    pub invalid_rows: i32,
    pub imported_rows: i32,
    pub status: String,
    pub content_hash: String,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_type_round_trips_through_tag() {
        for t in ImportType::ALL {
            assert_eq!(ImportType::parse(t.as_str()), Some(t));
        }
        assert_eq!(ImportType::parse("unknown"), None);
    }

    #[test]
    fn import_type_serde_uses_kebab_case() {
        let json = serde_json::to_string(&ImportType::AdvertisingSettlement).unwrap();
        assert_eq!(json, "\"advertising-settlement\"");
        let back: ImportType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ImportType::AdvertisingSettlement);
    }

    #[test]
    fn sales_like_types() {
        assert!(ImportType::Sales.is_sales_like());
        assert!(ImportType::ReturnsAndCancellations.is_sales_like());
        assert!(!ImportType::Products.is_sales_like());
        assert!(!ImportType::Stock.is_sales_like());
    }
}
