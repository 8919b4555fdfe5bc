pub mod config_cmd;
pub mod log_cmd;
pub mod output;
pub mod quota_cmd;
pub mod renderer;
pub mod selector;
pub mod topup_cmd;
