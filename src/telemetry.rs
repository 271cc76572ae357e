//! Telemetry utilities for dispatch timing.

use std::time::Instant;

/// Guard for timing a dispatch and recording metrics.
///
/// Records latency when dropped, unless the dispatch was marked failed.
pub struct DispatchTimer {
    kind: &'static str,
    start: Instant,
    failed: bool,
}

impl DispatchTimer {
    /// Start timing a dispatch of `kind`.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            start: Instant::now(),
            failed: false,
        }
    }

    /// Count the dispatch as a failure at `stage` instead of a success.
    pub fn fail(&mut self, stage: &str) {
        self.failed = true;
        crate::metrics::record_dispatch_failure(stage);
    }
}

impl Drop for DispatchTimer {
    fn drop(&mut self) {
        if self.failed {
            return;
        }
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_dispatch(self.kind, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span for one dispatched message.
    pub fn dispatch(kind: &str, sender: &str) -> Span {
        info_span!("dispatch", kind = %kind, sender = %sender)
    }

    /// Span for one message entering through a transport.
    pub fn incoming(transport: &str, sender: &str) -> Span {
        info_span!("incoming", transport = %transport, sender = %sender)
    }
}
