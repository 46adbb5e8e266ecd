pub mod auth;
pub mod config;
pub mod discovery;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

pub use config::Config;
pub use routes::create_routes;
pub use state::AppState;
