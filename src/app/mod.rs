pub mod ports;

pub use ports::{NoProgress, ProgressSink};
