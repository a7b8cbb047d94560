// HTTP module: server and upstream client.

pub mod client;
pub mod server;

pub use crate::middleware::middleware::Middleware;

// Re-export server types
pub use server::HttpServer;

// Common controller interface
pub use crate::controller::controller::Controller;
