//! HTTP API handlers for trackmap-pv

pub mod filters;
pub mod health;
pub mod query;
pub mod sample;
pub mod scatter;
pub mod summary;
pub mod ui;

pub use filters::get_filters;
pub use health::health_routes;
pub use query::ViewQuery;
pub use sample::get_sample;
pub use scatter::{get_scatter, get_scatter_svg};
pub use summary::get_summary;
pub use ui::{serve_app_js, serve_index};
