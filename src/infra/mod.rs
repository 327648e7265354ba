pub mod cache;
pub mod db;
pub mod memory;
pub mod postgres;
pub mod storage;
pub mod store;
