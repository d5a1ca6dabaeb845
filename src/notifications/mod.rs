pub mod delegates;
pub mod schemas;
pub mod transport;
