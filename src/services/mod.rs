pub mod api;
pub mod metrics;

pub use api::{router, serve, ApiState};
pub use metrics::PredictionMetrics;
