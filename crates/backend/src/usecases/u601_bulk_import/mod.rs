pub mod columns;
pub mod error;
pub mod executor;
pub mod import_config;
pub mod normalize;
pub mod parser;
pub mod validate;

pub use error::ImportError;
pub use executor::run_import;
