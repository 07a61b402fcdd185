pub mod attribution;
pub mod audit;
pub mod record;
