pub mod backup;
pub mod context;
pub mod duty;
pub mod export;
pub mod fleet;
pub mod log;
pub mod mutation;
pub mod remote;
pub mod sync;
pub mod timer;
