pub mod config;
pub mod cost;
pub mod formatter;
pub mod models;
