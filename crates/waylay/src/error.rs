//! Error types for the waylay crate.

use thiserror::Error;

/// Errors raised by the object model when calling or redefining methods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectError {
    /// No method with this name on the object, its own slots, or its class chain.
    #[error("method '{name}' not found")]
    MethodNotFound { name: String },

    /// Assignment to a slot whose `writable` attribute is off.
    #[error("method '{name}' is read-only")]
    ReadOnly { name: String },

    /// Redefinition or removal of a slot whose `configurable` attribute is off.
    #[error("method '{name}' is not configurable")]
    NotConfigurable { name: String },
}

/// Errors returned by [`HookRegistry`](crate::HookRegistry) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    /// The value given as a host is neither an object nor a class.
    #[error("invalid host: expected an object or a class, got {found}")]
    InvalidHost { found: &'static str },

    /// The registry was created without a host.
    #[error("registry has no bound host")]
    Unbound,

    /// The host does not directly define the method.
    #[error("{host} has no own method '{method}'")]
    MissingMethod { host: String, method: String },

    /// The method is already wrapped by a hook.
    #[error("method '{method}' of {host} is already hooked")]
    AlreadyHooked { host: String, method: String },

    /// No hook is installed for the method.
    #[error("method '{method}' is not hooked")]
    NotHooked { method: String },

    /// The method's slot refuses redefinition.
    #[error("method '{method}' of {host} is not configurable")]
    NotConfigurable { host: String, method: String },

    /// Restoring or wrapping the slot failed in the object model.
    #[error(transparent)]
    Object(#[from] ObjectError),
}

/// Result type for hook operations.
pub type Result<T> = std::result::Result<T, HookError>;
