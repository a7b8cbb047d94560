// Composition root: data source, snapshot cache and HTTP exposure.

pub mod app;
pub mod server;

pub use app::App;
pub use server::HttpServer;
