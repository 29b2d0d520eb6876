pub mod api;
pub mod bridge;
pub mod metrics;
pub mod state;
