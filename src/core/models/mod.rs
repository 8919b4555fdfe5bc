pub mod breakdown;
pub mod log;
pub mod payment;
