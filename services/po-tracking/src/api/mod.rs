//! 接口层

pub mod http;
pub mod state;

pub use http::{app, router};
pub use state::{AppState, Backends};
