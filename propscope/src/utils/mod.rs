pub mod cache;
pub mod conf;
pub mod error;
