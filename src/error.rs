//! Error types for the wait loop.
//!
//! Operation, expiry and scheduling failures all end the chain with a single
//! FAILED response to the orchestrator. A transport failure means that
//! response could not be delivered, so it is surfaced to the invocation's
//! caller instead.

/// Error raised while running one invocation of the wait loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitError {
    /// The custom resource's create/update/delete or status check failed.
    Operation(String),
    /// The signed response URL is (about to be) stale, or its expiry cannot
    /// be determined.
    Expiry(String),
    /// The continuation could not be handed to the scheduler.
    Scheduling(String),
    /// The response could not be delivered to the orchestrator.
    Transport(String),
    /// The invocation payload is not a valid event.
    InvalidEvent(String),
}

impl WaitError {
    /// Whether the error ends the chain with a FAILED response to the
    /// orchestrator (as opposed to being reported only to the caller).
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        matches!(
            self,
            Self::Operation(_) | Self::Expiry(_) | Self::Scheduling(_)
        )
    }
}

impl std::fmt::Display for WaitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Operation(message) => write!(f, "Operation failed: {message}"),
            Self::Expiry(message) => write!(f, "Waiting canceled: {message}"),
            Self::Scheduling(message) => write!(f, "Failed to schedule continuation: {message}"),
            Self::Transport(message) => write!(f, "Failed to deliver response: {message}"),
            Self::InvalidEvent(message) => write!(f, "Invalid invocation event: {message}"),
        }
    }
}

impl std::error::Error for WaitError {}

/// Why the signed expiry of a response URL could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpiryParseError {
    /// The URL carries neither `Expires` nor `X-Amz-Date` + `X-Amz-Expires`.
    Missing,
    /// An expiry parameter is present but cannot be parsed.
    Malformed {
        parameter: &'static str,
        value: String,
    },
}

impl std::fmt::Display for ExpiryParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => f.write_str("response URL has no signed expiry parameter"),
            Self::Malformed { parameter, value } => {
                write!(f, "response URL parameter {parameter} is malformed: {value:?}")
            }
        }
    }
}

impl std::error::Error for ExpiryParseError {}

impl From<ExpiryParseError> for WaitError {
    fn from(error: ExpiryParseError) -> Self {
        Self::Expiry(error.to_string())
    }
}
