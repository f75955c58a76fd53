//! Per-request open and close hooks.

use super::{ConnectPolicy, Connection};
use crate::error::{ConnectionError, RequestError};

/// Hook run before a request is dispatched. An error aborts the request; the
/// host should answer with [`ConnectionError::status_code`].
pub type BeforeRequestHook = Box<dyn Fn() -> Result<(), ConnectionError> + Send + Sync>;

/// Hook run after a request, whether or not it succeeded.
pub type TeardownHook = Box<dyn Fn() + Send + Sync>;

/// Registration surface of a host framework's request lifecycle.
pub trait RequestLifecycle {
    /// Registers a hook run before each request.
    fn on_before_request(&mut self, hook: BeforeRequestHook);

    /// Registers a hook run after each request, including failed ones.
    fn on_teardown_request(&mut self, hook: TeardownHook);
}

/// Opens the transport for each request and closes it afterwards when the
/// policy is [`ConnectPolicy::Always`]; does nothing otherwise.
#[derive(Debug, Clone)]
pub struct RequestHooks {
    connection: Connection,
    policy: ConnectPolicy,
}

impl RequestHooks {
    /// Hooks over `connection` following `policy`.
    #[must_use]
    pub const fn new(connection: Connection, policy: ConnectPolicy) -> Self {
        Self { connection, policy }
    }

    /// Policy the hooks follow.
    #[must_use]
    pub const fn policy(&self) -> ConnectPolicy {
        self.policy
    }

    /// Opens the transport ahead of a request.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the transport cannot be opened.
    pub fn before_request(&self) -> Result<(), ConnectionError> {
        if self.policy.is_always() {
            self.connection.open()?;
        }
        Ok(())
    }

    /// Closes the transport after a request. Close failures are reported and
    /// suppressed.
    pub fn teardown_request(&self) {
        if self.policy.is_always() {
            self.connection.release();
        }
    }

    /// Runs `work` as one request: open, work, teardown.
    ///
    /// Teardown also runs when `work` fails or panics.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Connection`] when the transport cannot be
    /// opened, in which case `work` is not run, or [`RequestError::Work`] with
    /// the work's own failure.
    pub fn run<F, R, E>(&self, work: F) -> Result<R, RequestError<E>>
    where
        F: FnOnce() -> Result<R, E>,
    {
        let _teardown = Teardown(self);
        self.before_request()?;
        work().map_err(RequestError::Work)
    }

    /// Registers the hooks with `host`. Returns `false` without registering
    /// anything when the policy is [`ConnectPolicy::OnDemand`].
    pub fn install<H>(&self, host: &mut H) -> bool
    where
        H: RequestLifecycle + ?Sized,
    {
        if !self.policy.is_always() {
            return false;
        }
        let before = self.clone();
        host.on_before_request(Box::new(move || before.before_request()));
        let teardown = self.clone();
        host.on_teardown_request(Box::new(move || teardown.teardown_request()));
        true
    }
}

struct Teardown<'a>(&'a RequestHooks);

impl Drop for Teardown<'_> {
    fn drop(&mut self) {
        self.0.teardown_request();
    }
}
