//! Explicit connection scopes and the autoconnect wrapper.

use super::Connection;
use crate::error::ConnectionError;

/// Keeps the transport open until dropped.
///
/// Only the scope that opened the transport closes it. A scope entered while
/// the transport is already open (inside a request under `ALWAYS_CONNECT`, or
/// inside another scope) leaves it open on drop.
#[must_use = "the transport closes as soon as the scope is dropped"]
#[derive(Debug)]
pub struct ConnectionScope {
    connection: Connection,
    owned: bool,
}

impl ConnectionScope {
    /// Opens `connection` and returns the guard that closes it.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the transport cannot be opened.
    pub fn enter(connection: Connection) -> Result<Self, ConnectionError> {
        let owned = !connection.is_open();
        connection.open()?;
        Ok(Self { connection, owned })
    }

    /// Connection held open by this scope.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Whether dropping this scope closes the transport.
    #[must_use]
    pub const fn owns_connection(&self) -> bool {
        self.owned
    }
}

impl Drop for ConnectionScope {
    fn drop(&mut self) {
        if self.owned {
            self.connection.release();
        }
    }
}

/// Wraps `work` so every call runs with the transport open.
///
/// The returned callable opens the transport, runs `work`, and closes the
/// transport again, also when `work` panics.
pub fn autoconnect<F, R>(connection: Connection, mut work: F) -> impl FnMut() -> Result<R, ConnectionError>
where
    F: FnMut() -> R,
{
    move || {
        let _scope = ConnectionScope::enter(connection.clone())?;
        Ok(work())
    }
}

/// [`autoconnect`] for callables taking an argument.
pub fn autoconnect_with<F, A, R>(
    connection: Connection,
    mut work: F,
) -> impl FnMut(A) -> Result<R, ConnectionError>
where
    F: FnMut(A) -> R,
{
    move |argument| {
        let _scope = ConnectionScope::enter(connection.clone())?;
        Ok(work(argument))
    }
}
