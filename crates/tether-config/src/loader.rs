//! Loading configuration for processes that own their settings.
//!
//! Layering is delegated to `ortho_config`; see [`Config::load_from_iter`].

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};

use crate::Config;

/// Loads the configuration for a client instance.
pub trait ConfigLoader: Send + Sync {
    /// Produces the resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns the `ortho_config` failure when a layer is unreadable or
    /// malformed.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader fed an explicit argument vector in place of the process arguments.
///
/// The first element is the program name, as with `std::env::args_os`.
#[derive(Debug, Clone, Default)]
pub struct ArgsConfigLoader {
    args: Vec<OsString>,
}

impl ArgsConfigLoader {
    /// Loader over `args`.
    #[must_use]
    pub fn new<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Arguments handed to `ortho_config`.
    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

impl ConfigLoader for ArgsConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter(self.args.iter().cloned())
    }
}
