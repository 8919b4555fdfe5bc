pub mod pricing;
pub mod timing;
pub mod tokens;
pub mod topup;
pub mod units;
