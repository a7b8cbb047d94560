#[cfg(test)]
mod tests;

#[cfg(test)]
pub use tests::support;

pub mod app;
pub mod cache;
pub mod config;
pub mod controller;
pub mod http;
pub mod metrics;
pub mod middleware;
pub mod model;
pub mod shutdown;
pub mod source;
pub mod storage;
pub mod workers;
