pub mod config;
pub mod endpoints;
pub mod utils;
