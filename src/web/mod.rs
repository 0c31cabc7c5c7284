pub mod api;
pub mod server;

pub use api::AppState;
pub use server::start_web_server;
