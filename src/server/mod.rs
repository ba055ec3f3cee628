//! HTTP server module
//!
//! Contains the application server, routing and shared state.

pub mod app;
pub mod routes;
pub mod state;

pub use app::App;
pub use routes::create_router;
pub use state::AppState;
