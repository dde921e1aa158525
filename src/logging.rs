//! Diagnostic reporting for send attempts.

/// Sink for the per-send diagnostics of [`crate::GatewayClient`].
///
/// Transport and gateway failures are not returned as errors; they are reported here.
pub trait GatewayLogger: Send + Sync {
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
    fn info(&self, message: &str);
}

#[derive(Debug, Clone, Copy, Default)]
/// [`GatewayLogger`] that emits `tracing` events with target `fitsms`.
pub struct TracingLogger;

impl GatewayLogger for TracingLogger {
    fn warn(&self, message: &str) {
        tracing::warn!(target: "fitsms", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "fitsms", "{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "fitsms", "{message}");
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    #[traced_test]
    #[test]
    fn tracing_logger_forwards_all_levels() {
        let logger = TracingLogger;
        logger.warn("cannot reach gateway");
        logger.error("gateway said no");
        logger.info("sent");

        assert!(logs_contain("cannot reach gateway"));
        assert!(logs_contain("gateway said no"));
        assert!(logs_contain("sent"));
    }
}
