use contracts::imports::ImportType;

use super::normalize::DEFAULT_DATE_PATTERNS;

/// How a canonical field is normalized and validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// The natural key. Exactly one per import type, always mandatory.
    Key,
    Date,
    Amount,
    Integer,
    Text,
}

/// One canonical field of an import type: its name, the prioritized header
/// aliases that may carry it in a source file, and its validation rules.
#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    /// Tried in order; the first alias present in the file wins.
    pub aliases: &'static [&'static str],
    pub kind: FieldKind,
    /// Mandatory column: resolution fails if no alias is present, and a
    /// blank or unparseable value is a row error.
    pub required: bool,
    /// Label substituted for blank text or the `-` sentinel.
    pub default_label: Option<&'static str>,
}

/// Everything the pipeline needs to know about one import type. The alias
/// tables and required sets live here, not in code, so a rule change is a
/// table edit.
#[derive(Debug)]
pub struct ImportSpec {
    pub import_type: ImportType,
    pub fields: &'static [FieldSpec],
    pub date_patterns: &'static [&'static str],
    /// Canonical field stored in the record's `record_date` column and used
    /// for batch date-range inference.
    pub date_field: Option<&'static str>,
    pub amount_field: Option<&'static str>,
    pub quantity_field: Option<&'static str>,
    pub account_field: Option<&'static str>,
    pub status_field: Option<&'static str>,
}

impl ImportSpec {
    pub fn key_field(&self) -> &'static str {
        self.fields
            .iter()
            .find(|f| f.kind == FieldKind::Key)
            .map(|f| f.name)
            .expect("every import spec declares a key field")
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

const UNKNOWN: Option<&str> = Some("Unknown");

static SALES: ImportSpec = ImportSpec {
    import_type: ImportType::Sales,
    fields: &[
        FieldSpec {
            name: "order_id",
            aliases: &["Order ID", "order_id", "ORDER_ID", "OrderId", "Order Id", "No Pesanan"],
            kind: FieldKind::Key,
            required: true,
            default_label: None,
        },
        FieldSpec {
            name: "order_date",
            aliases: &["Order Date", "order_date", "ORDER_DATE", "Tanggal Pesanan", "Date"],
            kind: FieldKind::Date,
            required: true,
            default_label: None,
        },
        FieldSpec {
            name: "product_name",
            aliases: &["Product Name", "product_name", "Product", "Nama Produk"],
            kind: FieldKind::Text,
            required: false,
            default_label: UNKNOWN,
        },
        FieldSpec {
            name: "quantity",
            aliases: &["Quantity", "quantity", "Qty", "Jumlah"],
            kind: FieldKind::Integer,
            required: false,
            default_label: None,
        },
        FieldSpec {
            name: "total_amount",
            aliases: &["Total Amount", "total_amount", "Amount", "Total", "Total Pesanan"],
            kind: FieldKind::Amount,
            required: false,
            default_label: None,
        },
        FieldSpec {
            name: "customer_name",
            aliases: &["Customer Name", "customer_name", "Customer", "Nama Pembeli"],
            kind: FieldKind::Text,
            required: false,
            default_label: UNKNOWN,
        },
        FieldSpec {
            name: "order_status",
            aliases: &["Order Status", "order_status", "Status", "Status Pesanan"],
            kind: FieldKind::Text,
            required: false,
            default_label: None,
        },
    ],
    date_patterns: DEFAULT_DATE_PATTERNS,
    date_field: Some("order_date"),
    amount_field: Some("total_amount"),
    quantity_field: Some("quantity"),
    account_field: Some("customer_name"),
    status_field: Some("order_status"),
};

static PRODUCTS: ImportSpec = ImportSpec {
    import_type: ImportType::Products,
    fields: &[
        FieldSpec {
            name: "product_code",
            aliases: &["Product Code", "product_code", "SKU", "sku", "Kode Produk"],
            kind: FieldKind::Key,
            required: true,
            default_label: None,
        },
        FieldSpec {
            name: "product_name",
            aliases: &["Product Name", "product_name", "Name", "Nama Produk"],
            kind: FieldKind::Text,
            required: true,
            default_label: None,
        },
        FieldSpec {
            name: "category",
            aliases: &["Category", "category", "Kategori"],
            kind: FieldKind::Text,
            required: false,
            default_label: UNKNOWN,
        },
        FieldSpec {
            name: "price",
            aliases: &["Price", "price", "Unit Price", "Harga"],
            kind: FieldKind::Amount,
            required: false,
            default_label: None,
        },
        FieldSpec {
            name: "stock",
            aliases: &["Stock", "stock", "Stok"],
            kind: FieldKind::Integer,
            required: false,
            default_label: None,
        },
        FieldSpec {
            name: "supplier",
            aliases: &["Supplier", "supplier", "Supplier Name"],
            kind: FieldKind::Text,
            required: false,
            default_label: UNKNOWN,
        },
    ],
    date_patterns: DEFAULT_DATE_PATTERNS,
    date_field: None,
    amount_field: Some("price"),
    quantity_field: Some("stock"),
    account_field: Some("supplier"),
    status_field: None,
};

static STOCK: ImportSpec = ImportSpec {
    import_type: ImportType::Stock,
    fields: &[
        FieldSpec {
            name: "product_code",
            aliases: &["Product Code", "product_code", "SKU", "sku", "Kode Produk"],
            kind: FieldKind::Key,
            required: true,
            default_label: None,
        },
        FieldSpec {
            name: "quantity",
            aliases: &["Quantity", "quantity", "Qty", "Stock", "Stok"],
            kind: FieldKind::Integer,
            required: true,
            default_label: None,
        },
        FieldSpec {
            name: "warehouse",
            aliases: &["Warehouse", "warehouse", "Gudang"],
            kind: FieldKind::Text,
            required: false,
            default_label: UNKNOWN,
        },
        FieldSpec {
            name: "stock_date",
            aliases: &["Stock Date", "stock_date", "Date", "Tanggal"],
            kind: FieldKind::Date,
            required: false,
            default_label: None,
        },
    ],
    date_patterns: DEFAULT_DATE_PATTERNS,
    date_field: Some("stock_date"),
    amount_field: None,
    quantity_field: Some("quantity"),
    account_field: Some("warehouse"),
    status_field: None,
};

static ADVERTISING: ImportSpec = ImportSpec {
    import_type: ImportType::Advertising,
    fields: &[
        FieldSpec {
            name: "campaign_id",
            aliases: &["Campaign ID", "campaign_id", "CAMPAIGN_ID", "Campaign", "ID Iklan"],
            kind: FieldKind::Key,
            required: true,
            default_label: None,
        },
        FieldSpec {
            name: "ad_date",
            aliases: &["Date", "ad_date", "Ad Date", "Tanggal"],
            kind: FieldKind::Date,
            required: true,
            default_label: None,
        },
        FieldSpec {
            name: "spend",
            aliases: &["Spend", "spend", "Cost", "Biaya", "Expense"],
            kind: FieldKind::Amount,
            required: false,
            default_label: None,
        },
        FieldSpec {
            name: "platform",
            aliases: &["Platform", "platform", "Channel"],
            kind: FieldKind::Text,
            required: false,
            default_label: UNKNOWN,
        },
    ],
    date_patterns: DEFAULT_DATE_PATTERNS,
    date_field: Some("ad_date"),
    amount_field: Some("spend"),
    quantity_field: None,
    account_field: Some("platform"),
    status_field: None,
};

static ADVERTISING_SETTLEMENT: ImportSpec = ImportSpec {
    import_type: ImportType::AdvertisingSettlement,
    fields: &[
        FieldSpec {
            name: "settlement_order_id",
            aliases: &[
                "Settlement Order ID",
                "settlement_order_id",
                "Order ID",
                "order_id",
                "No. Pesanan",
            ],
            kind: FieldKind::Key,
            required: true,
            default_label: None,
        },
        FieldSpec {
            name: "settlement_date",
            aliases: &["Settlement Date", "settlement_date", "Date", "Tanggal"],
            kind: FieldKind::Date,
            required: true,
            default_label: None,
        },
        // Most permissive variant is authoritative: amount is optional and
        // defaults to zero.
        FieldSpec {
            name: "settlement_amount",
            aliases: &["Settlement Amount", "settlement_amount", "Amount", "Total"],
            kind: FieldKind::Amount,
            required: false,
            default_label: None,
        },
        FieldSpec {
            name: "account",
            aliases: &["Account", "account", "Account Name", "Akun"],
            kind: FieldKind::Text,
            required: false,
            default_label: UNKNOWN,
        },
    ],
    date_patterns: DEFAULT_DATE_PATTERNS,
    date_field: Some("settlement_date"),
    amount_field: Some("settlement_amount"),
    quantity_field: None,
    account_field: Some("account"),
    status_field: None,
};

static RETURNS_AND_CANCELLATIONS: ImportSpec = ImportSpec {
    import_type: ImportType::ReturnsAndCancellations,
    fields: &[
        FieldSpec {
            name: "return_id",
            aliases: &["Return ID", "return_id", "Returns ID", "No Pengembalian"],
            kind: FieldKind::Key,
            required: true,
            default_label: None,
        },
        FieldSpec {
            name: "order_id",
            aliases: &["Order ID", "order_id", "No Pesanan"],
            kind: FieldKind::Text,
            required: false,
            default_label: None,
        },
        FieldSpec {
            name: "return_date",
            aliases: &["Return Date", "return_date", "Date", "Tanggal"],
            kind: FieldKind::Date,
            required: true,
            default_label: None,
        },
        FieldSpec {
            name: "refund_amount",
            aliases: &["Refund Amount", "refund_amount", "Amount", "Jumlah Pengembalian"],
            kind: FieldKind::Amount,
            required: false,
            default_label: None,
        },
        FieldSpec {
            name: "reason",
            aliases: &["Reason", "reason", "Alasan"],
            kind: FieldKind::Text,
            required: false,
            default_label: UNKNOWN,
        },
        FieldSpec {
            name: "return_status",
            aliases: &["Status", "return_status", "Return Status"],
            kind: FieldKind::Text,
            required: false,
            default_label: None,
        },
    ],
    date_patterns: DEFAULT_DATE_PATTERNS,
    date_field: Some("return_date"),
    amount_field: Some("refund_amount"),
    quantity_field: None,
    account_field: None,
    status_field: Some("return_status"),
};

static MARKETPLACE_REIMBURSEMENTS: ImportSpec = ImportSpec {
    import_type: ImportType::MarketplaceReimbursements,
    fields: &[
        FieldSpec {
            name: "claim_id",
            aliases: &["Claim ID", "claim_id", "CLAIM_ID", "ClaimId"],
            kind: FieldKind::Key,
            required: true,
            default_label: None,
        },
        FieldSpec {
            name: "claim_date",
            aliases: &["Claim Date", "claim_date", "Date", "Tanggal"],
            kind: FieldKind::Date,
            required: true,
            default_label: None,
        },
        FieldSpec {
            name: "reimbursed_amount",
            aliases: &["Reimbursed Amount", "reimbursed_amount", "Amount", "Total"],
            kind: FieldKind::Amount,
            required: false,
            default_label: None,
        },
        FieldSpec {
            name: "order_id",
            aliases: &["Order ID", "order_id", "No Pesanan"],
            kind: FieldKind::Text,
            required: false,
            default_label: None,
        },
        FieldSpec {
            name: "reason",
            aliases: &["Reason", "reason", "Alasan"],
            kind: FieldKind::Text,
            required: false,
            default_label: UNKNOWN,
        },
    ],
    date_patterns: DEFAULT_DATE_PATTERNS,
    date_field: Some("claim_date"),
    amount_field: Some("reimbursed_amount"),
    quantity_field: None,
    account_field: None,
    status_field: None,
};

static COMMISSION_ADJUSTMENTS: ImportSpec = ImportSpec {
    import_type: ImportType::CommissionAdjustments,
    fields: &[
        FieldSpec {
            name: "adjustment_id",
            aliases: &["Adjustment ID", "adjustment_id", "AdjustmentId"],
            kind: FieldKind::Key,
            required: true,
            default_label: None,
        },
        FieldSpec {
            name: "adjustment_date",
            aliases: &["Adjustment Date", "adjustment_date", "Date", "Tanggal"],
            kind: FieldKind::Date,
            required: true,
            default_label: None,
        },
        FieldSpec {
            name: "adjustment_amount",
            aliases: &["Adjustment Amount", "adjustment_amount", "Amount"],
            kind: FieldKind::Amount,
            required: false,
            default_label: None,
        },
        FieldSpec {
            name: "order_id",
            aliases: &["Order ID", "order_id", "No Pesanan"],
            kind: FieldKind::Text,
            required: false,
            default_label: None,
        },
        FieldSpec {
            name: "note",
            aliases: &["Note", "note", "Description", "Keterangan"],
            kind: FieldKind::Text,
            required: false,
            default_label: None,
        },
    ],
    date_patterns: DEFAULT_DATE_PATTERNS,
    date_field: Some("adjustment_date"),
    amount_field: Some("adjustment_amount"),
    quantity_field: None,
    account_field: None,
    status_field: None,
};

static AFFILIATE_SAMPLES: ImportSpec = ImportSpec {
    import_type: ImportType::AffiliateSamples,
    fields: &[
        FieldSpec {
            name: "sample_id",
            aliases: &["Sample ID", "sample_id", "SampleId", "ID Sampel"],
            kind: FieldKind::Key,
            required: true,
            default_label: None,
        },
        FieldSpec {
            name: "request_date",
            aliases: &["Request Date", "request_date", "Date", "Tanggal"],
            kind: FieldKind::Date,
            required: true,
            default_label: None,
        },
        FieldSpec {
            name: "affiliate_name",
            aliases: &["Affiliate Name", "affiliate_name", "Affiliate", "Nama Affiliate"],
            kind: FieldKind::Text,
            required: false,
            default_label: UNKNOWN,
        },
        FieldSpec {
            name: "product_name",
            aliases: &["Product Name", "product_name", "Product", "Nama Produk"],
            kind: FieldKind::Text,
            required: false,
            default_label: UNKNOWN,
        },
        FieldSpec {
            name: "quantity",
            aliases: &["Quantity", "quantity", "Qty", "Jumlah"],
            kind: FieldKind::Integer,
            required: false,
            default_label: None,
        },
        FieldSpec {
            name: "sample_value",
            aliases: &["Sample Value", "sample_value", "Value", "Nilai"],
            kind: FieldKind::Amount,
            required: false,
            default_label: None,
        },
    ],
    date_patterns: DEFAULT_DATE_PATTERNS,
    date_field: Some("request_date"),
    amount_field: Some("sample_value"),
    quantity_field: Some("quantity"),
    account_field: Some("affiliate_name"),
    status_field: None,
};

pub fn spec_for(import_type: ImportType) -> &'static ImportSpec {
    match import_type {
        ImportType::Sales => &SALES,
        ImportType::Products => &PRODUCTS,
        ImportType::Stock => &STOCK,
        ImportType::Advertising => &ADVERTISING,
        ImportType::AdvertisingSettlement => &ADVERTISING_SETTLEMENT,
        ImportType::ReturnsAndCancellations => &RETURNS_AND_CANCELLATIONS,
        ImportType::MarketplaceReimbursements => &MARKETPLACE_REIMBURSEMENTS,
        ImportType::CommissionAdjustments => &COMMISSION_ADJUSTMENTS,
        ImportType::AffiliateSamples => &AFFILIATE_SAMPLES,
    }
}
