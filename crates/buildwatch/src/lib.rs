#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod consume;
pub mod fakes;
pub mod models;
pub mod normalize;
pub mod notify;
pub mod report;
pub mod resolve;
pub mod telemetry;
pub mod upstream;
pub mod utils;

pub use cli::app::{Cli, Command};
