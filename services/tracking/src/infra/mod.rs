pub mod cache;
pub mod capi;
pub mod db;
