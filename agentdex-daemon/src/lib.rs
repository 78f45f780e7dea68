//! Scheduled catalog sync: one `run_once` per interval until ctrl-c.

mod error;
mod runtime;
pub mod schedule;
pub mod telemetry;

pub use error::DaemonError;
pub use runtime::{run, run_until, start_blocking, LoopStats};
pub use schedule::{format_interval, parse_interval, DEFAULT_INTERVAL};
pub use telemetry::init_tracing;
