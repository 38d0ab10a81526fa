pub mod pool;
pub mod versioning;
