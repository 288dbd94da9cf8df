pub mod api;
pub mod middleware;
pub mod router;
pub mod server;
pub mod state;
pub mod utils;
