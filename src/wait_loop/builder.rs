use super::WaitLoop;
use crate::config::WaitConfig;
use crate::hooks::{DefaultHooks, WaitHooks};
use crate::resource::CustomResource;
use crate::scheduler::Scheduler;
use crate::transport::{CallbackTransport, HttpsTransport};
use std::sync::Arc;

/// Builder for constructing a `WaitLoop`.
///
/// # Example
///
/// ```ignore
/// let wait_loop = cfn_wait::builder()
///     .resource(my_resource)
///     .scheduler(LambdaScheduler::from_env(function_arn).await)
///     .config(WaitConfig::from_env()?)
///     .build();
/// ```
pub struct WaitLoopBuilder<R, S, T, H> {
    resource: Option<R>,
    scheduler: Option<S>,
    transport: Option<T>,
    hooks: Option<H>,
    config: Option<WaitConfig>,
}

impl WaitLoopBuilder<(), (), (), ()> {
    /// Create a new builder with no components set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            resource: None,
            scheduler: None,
            transport: None,
            hooks: None,
            config: None,
        }
    }
}

impl Default for WaitLoopBuilder<(), (), (), ()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, S, T, H> WaitLoopBuilder<R, S, T, H> {
    /// Set the custom resource.
    #[must_use]
    pub fn resource<R2: CustomResource>(self, resource: R2) -> WaitLoopBuilder<R2, S, T, H> {
        WaitLoopBuilder {
            resource: Some(resource),
            scheduler: self.scheduler,
            transport: self.transport,
            hooks: self.hooks,
            config: self.config,
        }
    }

    /// Set the scheduler used for continuations.
    #[must_use]
    pub fn scheduler<S2: Scheduler>(self, scheduler: S2) -> WaitLoopBuilder<R, S2, T, H> {
        WaitLoopBuilder {
            resource: self.resource,
            scheduler: Some(scheduler),
            transport: self.transport,
            hooks: self.hooks,
            config: self.config,
        }
    }

    /// Set the response transport.
    #[must_use]
    pub fn transport<T2: CallbackTransport>(self, transport: T2) -> WaitLoopBuilder<R, S, T2, H> {
        WaitLoopBuilder {
            resource: self.resource,
            scheduler: self.scheduler,
            transport: Some(transport),
            hooks: self.hooks,
            config: self.config,
        }
    }

    /// Set the lifecycle hooks.
    #[must_use]
    pub fn hooks<H2: WaitHooks>(self, hooks: H2) -> WaitLoopBuilder<R, S, T, H2> {
        WaitLoopBuilder {
            resource: self.resource,
            scheduler: self.scheduler,
            transport: self.transport,
            hooks: Some(hooks),
            config: self.config,
        }
    }

    /// Set the wait configuration.
    #[must_use]
    pub fn config(mut self, config: WaitConfig) -> Self {
        self.config = Some(config);
        self
    }
}

impl<R, S> WaitLoopBuilder<R, S, (), ()>
where
    R: CustomResource + 'static,
    S: Scheduler + 'static,
{
    /// Build the wait loop with the HTTPS transport and no-op hooks.
    ///
    /// This is a convenience method that uses:
    /// - `HttpsTransport` for delivering the response
    /// - `DefaultHooks` for hooks
    /// - `WaitConfig::default()` if no config is set
    ///
    /// # Panics
    ///
    /// Panics if the resource or the scheduler has not been set.
    #[must_use]
    pub fn build(self) -> WaitLoop<R, S, HttpsTransport, DefaultHooks> {
        let resource = self.resource.expect("resource is required");
        let scheduler = self.scheduler.expect("scheduler is required");

        WaitLoop {
            resource: Arc::new(resource),
            scheduler: Arc::new(scheduler),
            transport: Arc::new(HttpsTransport::new()),
            hooks: Arc::new(DefaultHooks),
            config: self.config.unwrap_or_default(),
        }
    }
}

impl<R, S, T, H> WaitLoopBuilder<R, S, T, H>
where
    R: CustomResource + 'static,
    S: Scheduler + 'static,
    T: CallbackTransport + 'static,
    H: WaitHooks + 'static,
{
    /// Build the wait loop with all custom components.
    ///
    /// # Panics
    ///
    /// Panics if any of the following have not been set:
    /// - `resource`
    /// - `scheduler`
    /// - `transport`
    /// - `hooks`
    #[must_use]
    pub fn build_with_components(self) -> WaitLoop<R, S, T, H> {
        let resource = self.resource.expect("resource is required");
        let scheduler = self.scheduler.expect("scheduler is required");
        let transport = self
            .transport
            .expect("transport is required when using build_with_components");
        let hooks = self
            .hooks
            .expect("hooks is required when using build_with_components");

        WaitLoop {
            resource: Arc::new(resource),
            scheduler: Arc::new(scheduler),
            transport: Arc::new(transport),
            hooks: Arc::new(hooks),
            config: self.config.unwrap_or_default(),
        }
    }
}
