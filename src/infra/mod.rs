// Infrastructure adapters for application ports

pub mod progress;

pub use progress::{BarProgress, TracingProgress};
