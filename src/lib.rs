pub mod backend;
pub mod cli;
pub mod config;
pub mod contract;
pub mod database;
pub mod error;
pub mod sacco;
pub mod telemetry;
