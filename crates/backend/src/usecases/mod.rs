pub mod u601_bulk_import;
pub mod u602_duplicate_check;
