// HTTP middlewares.

pub mod cors_middleware;
pub mod middleware;
pub mod recover_middleware;
pub mod trace_middleware;
