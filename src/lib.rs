pub mod config;
pub mod masters;
pub mod shared;
pub mod tickets;
