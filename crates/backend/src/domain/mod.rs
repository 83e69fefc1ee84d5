pub mod a101_import_batch;
