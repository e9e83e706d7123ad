pub mod admin;
pub mod commands;
pub mod serve;

pub use commands::{Cli, Commands};
