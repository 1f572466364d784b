pub mod api_server;

pub use api_server::{load_app_state, start_api_server};
