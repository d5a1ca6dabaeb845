pub mod delegates;
pub mod endpoints;
pub mod schemas;
