pub mod shutdown;
pub mod signal;
