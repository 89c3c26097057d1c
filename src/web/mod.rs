pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use routes::create_routes;
pub use server::{project_criteria, run_server};
pub use state::AppState;
