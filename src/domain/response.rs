use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// The gateway answered with an empty body.
    EmptyResponse,
    /// The body was not the XML document the gateway is supposed to send.
    UnexpectedResponse,
    /// The gateway reported `ERROR`.
    Gateway,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Outcome reported by the gateway for one send request.
pub enum GatewayResponse {
    Success {
        /// The gateway ran in test mode and did not deliver anything.
        test: bool,
        recipients: usize,
        deliver_date: Option<NaiveDateTime>,
        /// Warnings other than the test-mode indicator.
        warnings: Vec<String>,
        message: String,
    },
    Failure {
        reason: FailureReason,
        message: String,
    },
}

impl GatewayResponse {
    /// Build a failure with the given reason and message.
    pub fn failure(reason: FailureReason, message: impl Into<String>) -> Self {
        Self::Failure {
            reason,
            message: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    pub fn is_test(&self) -> bool {
        matches!(self, Self::Success { test: true, .. })
    }

    /// Human readable summary, suitable for logging.
    pub fn message(&self) -> &str {
        match self {
            Self::Success { message, .. } | Self::Failure { message, .. } => message,
        }
    }
}
