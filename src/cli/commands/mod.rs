pub mod backup;
pub mod config;
pub mod db;
pub mod duty;
pub mod expense;
pub mod export;
pub mod init;
pub mod log;
pub mod maintenance;
pub mod sync;
pub mod trip;
pub mod vehicle;
