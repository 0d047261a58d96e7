pub mod duty_log;
pub mod expense;
pub mod maintenance;
pub mod sync;
pub mod table;
pub mod trip;
pub mod vehicle;
