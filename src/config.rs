//! Configuration for the wait loop.

use anyhow::{Context, Result, bail};
use std::time::Duration;

/// Default pause before scheduling the next invocation.
pub const DEFAULT_WAIT_DELAY: Duration = Duration::from_secs(60);

/// Default margin kept between "now" and the signed expiry of the response
/// URL. Matches the maximum Lambda execution time, so it is also the
/// smallest margin accepted.
pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::from_secs(300);

/// How Delete requests interact with the wait loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Run the delete operation and respond right away without a status check.
    #[default]
    FinishImmediately,
    /// Treat Delete like Create and Update: poll until the status check
    /// reports completion.
    Wait,
}

impl DeletePolicy {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "finish" | "finish_immediately" | "immediate" => Some(Self::FinishImmediately),
            "wait" => Some(Self::Wait),
            _ => None,
        }
    }
}

/// Configuration for the wait loop.
#[derive(Clone, Debug)]
pub struct WaitConfig {
    /// Pause taken inside an invocation before the next one is scheduled.
    /// Throttles re-invocations so a long wait does not exhaust the account's
    /// unreserved concurrency. Must stay below the invocation time limit.
    pub wait_delay: Duration,
    /// A continuation is only scheduled while the response URL stays valid
    /// for longer than this.
    pub safety_margin: Duration,
    /// Whether Delete requests skip the wait loop.
    pub delete_policy: DeletePolicy,
    /// Log stream referenced by the default response reason.
    pub log_stream_name: Option<String>,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            wait_delay: DEFAULT_WAIT_DELAY,
            safety_margin: DEFAULT_SAFETY_MARGIN,
            delete_policy: DeletePolicy::default(),
            log_stream_name: None,
        }
    }
}

impl WaitConfig {
    /// Create a config that schedules continuations without pausing (for testing)
    #[must_use]
    pub fn no_delay() -> Self {
        Self {
            wait_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    #[must_use]
    pub fn with_log_stream_name(mut self, name: impl Into<String>) -> Self {
        self.log_stream_name = Some(name.into());
        self
    }

    /// Check that the margin covers a full invocation and the pause fits
    /// inside it.
    ///
    /// # Errors
    /// Returns an error if `safety_margin` is shorter than
    /// [`DEFAULT_SAFETY_MARGIN`] or `wait_delay` is not shorter than
    /// `safety_margin`.
    pub fn validate(&self) -> Result<()> {
        if self.safety_margin < DEFAULT_SAFETY_MARGIN {
            bail!(
                "safety margin ({}s) must be at least the maximum invocation time ({}s)",
                self.safety_margin.as_secs(),
                DEFAULT_SAFETY_MARGIN.as_secs()
            );
        }
        if self.wait_delay >= self.safety_margin {
            bail!(
                "wait delay ({}s) must be shorter than the safety margin ({}s)",
                self.wait_delay.as_secs(),
                self.safety_margin.as_secs()
            );
        }
        Ok(())
    }

    /// Build a config from the process environment.
    ///
    /// Reads `CFN_WAIT_DELAY_SECS`, `CFN_WAIT_SAFETY_MARGIN_SECS`,
    /// `CFN_WAIT_DELETE_POLICY` and `AWS_LAMBDA_LOG_STREAM_NAME`.
    ///
    /// # Errors
    /// Returns an error if a variable is set to an invalid value or the
    /// resulting config does not validate.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    ///
    /// # Errors
    /// Same as [`WaitConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(delay) = seconds(&lookup, "CFN_WAIT_DELAY_SECS")? {
            config.wait_delay = delay;
        }
        if let Some(margin) = seconds(&lookup, "CFN_WAIT_SAFETY_MARGIN_SECS")? {
            config.safety_margin = margin;
        }
        if let Some(raw) = lookup("CFN_WAIT_DELETE_POLICY") {
            config.delete_policy = DeletePolicy::parse(&raw)
                .with_context(|| format!("CFN_WAIT_DELETE_POLICY must be 'finish' or 'wait', got {raw:?}"))?;
        }
        config.log_stream_name = lookup("AWS_LAMBDA_LOG_STREAM_NAME").filter(|s| !s.is_empty());

        config.validate()?;
        Ok(config)
    }
}

fn seconds(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<Duration>> {
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{name} must be a whole number of seconds, got {raw:?}"))?;
    Ok(Some(Duration::from_secs(secs)))
}
