pub mod metrics;
pub mod analytics;

use futures_core::Stream;
use std::pin::Pin;

pub use metrics::{LiveMetrics, MetricsSnapshot, PerformanceMetrics};
pub use analytics::ObservabilityLayer;

/// Type alias for boxed streams (stable Rust compatible)
pub type BoxStream<T> = Pin<Box<dyn Stream<Item = T> + Send + 'static>>;

/// Install a `tracing-subscriber` formatter honoring `RUST_LOG`.
///
/// Safe to call from every test or binary entry point; only the first call
/// installs anything.
#[cfg(feature = "tracing-basic")]
pub fn init_tracing() {
    use std::sync::Once;
    use tracing_subscriber::EnvFilter;

    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
}
