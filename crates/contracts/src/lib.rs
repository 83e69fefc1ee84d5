pub mod duplicate;
pub mod imports;
