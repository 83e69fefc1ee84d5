pub mod db;
pub mod scratch;
